//! Chat entry domain module.
//!
//! - `model`: the `Entry` record and its generation state machine
//! - `store`: the ordered local collection with trimming and remote merge
//! - `repository`: trait for the remote-persisted mirror

mod model;
mod repository;
mod store;

pub use model::{Entry, GenerationStatus, STOPPED_PROMPT};
pub use repository::EntryRepository;
pub use store::{EntryStore, TrimPolicy};
