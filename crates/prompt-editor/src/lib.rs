// prompt-editor: the ordered section list of a prompt, the prompt list, and
// the text rules of the section editor.

pub mod compile;
pub mod input;
pub mod prompts;
pub mod sections;

use prompt_core::NodeId;

pub use compile::compile_prompt;
pub use input::{enter_action, EnterAction};
pub use prompts::{max_prompt_id, PromptBook, MAX_PROMPTS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SectionError {
    #[error("section {0} not found")]
    NotFound(NodeId),
    #[error("section {0} is not linked to a component")]
    NotLinked(NodeId),
    #[error("prompt {0} not found")]
    PromptNotFound(NodeId),
}
