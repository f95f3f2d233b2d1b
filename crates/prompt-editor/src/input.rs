// Section editor text rules.

/// Find the largest byte offset <= idx that is a valid char boundary in the string.
pub fn floor_char_boundary(s: &str, idx: usize) -> usize {
    if idx >= s.len() {
        return s.len();
    }
    let mut i = idx;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// What an Enter key press does inside a section's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnterAction {
    /// Caret at the end of the text: start a new section after this one.
    NewSection,
    /// Anywhere else, or Shift+Enter: plain newline at the caret.
    InsertNewline { content: String },
}

/// Decide the effect of Enter for `content` with the caret at byte offset `cursor`.
/// Only a caret sitting at the very end splits; mid-text Enter never does.
pub fn enter_action(content: &str, cursor: usize, shift: bool) -> EnterAction {
    let cursor = floor_char_boundary(content, cursor);
    if !shift && cursor == content.len() {
        return EnterAction::NewSection;
    }
    let mut next = String::with_capacity(content.len() + 1);
    next.push_str(&content[..cursor]);
    next.push('\n');
    next.push_str(&content[cursor..]);
    EnterAction::InsertNewline { content: next }
}
