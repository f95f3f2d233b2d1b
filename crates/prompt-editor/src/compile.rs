// Compiling a prompt's sections into the text handed to the clipboard.

use prompt_core::Section;

const SEPARATOR: &str = "\n\n";

/// Join section contents with a blank line.
///
/// With `system_prompt` set, the guide text comes first and each section is
/// introduced by a `# <Type>: <Name>` heading.
pub fn compile_prompt(sections: &[Section], system_prompt: Option<&str>) -> String {
    match system_prompt {
        None => sections
            .iter()
            .map(|s| s.content.as_str())
            .collect::<Vec<_>>()
            .join(SEPARATOR),
        Some(guide) => {
            let mut blocks = Vec::with_capacity(sections.len() + 1);
            if !guide.trim().is_empty() {
                blocks.push(guide.trim_end().to_string());
            }
            for s in sections {
                blocks.push(format!("# {}: {}{SEPARATOR}{}", s.kind.label(), s.name, s.content));
            }
            blocks.join(SEPARATOR)
        }
    }
}
