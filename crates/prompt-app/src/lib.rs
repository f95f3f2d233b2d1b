// prompt-app: application state around the tree store and section editor,
// the drag session and drop reconciliation, persistence, settings, JSON
// import/export and clipboard export.

pub mod clipboard;
pub mod drag_drop;
pub mod render;
pub mod settings;
pub mod state;
pub mod storage;
pub mod transfer;

pub use drag_drop::{DragSession, DragSource, DropRejected};
pub use state::{AppError, AppState};
