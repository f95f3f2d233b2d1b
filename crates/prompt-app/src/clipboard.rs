// Clipboard export of the active prompt.

use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Backend(#[from] arboard::Error),
}

pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// The system clipboard. Opened lazily so commands that never copy don't
/// need a display connection.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()?,
        };
        let clipboard = self.inner.insert(clipboard);
        clipboard.set_text(text.to_owned())?;
        Ok(())
    }
}

/// Compile the active prompt and hand it to `sink`. Returns the copied text.
pub fn copy_active_prompt(
    state: &AppState,
    sink: &mut dyn ClipboardSink,
) -> Result<String, ClipboardError> {
    let text = state.compiled_prompt();
    sink.set_text(&text)?;
    log::info!(
        "Copied prompt {} ({} bytes)",
        state.prompts().active().name,
        text.len()
    );
    Ok(text)
}
