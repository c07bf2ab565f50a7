//! Saved prompt domain module.

mod model;
mod repository;
mod store;

pub use model::{SavedPrompt, UndoRecord};
pub use repository::SavedPromptRepository;
pub use store::{DEFAULT_UNDO_WINDOW, SavedPromptStore};
