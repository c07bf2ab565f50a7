//! Domain layer for PromptLens.
//!
//! This crate holds the core models and the traits at the seams: the chat
//! entry and its generation state machine, the ordered entry store with
//! trimming and remote-merge rules, the saved-prompt collection with
//! delete-undo, the credit ledger, and the collaborator interfaces (transform
//! gateway, blob store, image transform, repositories) the application layer
//! is wired against.

pub mod blob;
pub mod config;
pub mod credit;
pub mod entry;
pub mod error;
pub mod gateway;
pub mod image;
pub mod saved;

pub use error::{PromptLensError, Result};
