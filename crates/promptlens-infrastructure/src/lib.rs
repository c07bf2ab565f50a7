//! Storage and platform adapters for PromptLens.
//!
//! Implements the core repository traits over TOML files and an in-memory
//! backend, plus filesystem blob storage and settings handling.

pub mod fs_blob_store;
pub mod inline_transform;
pub mod memory;
pub mod settings;
pub mod toml_history;
pub mod toml_store;

pub use fs_blob_store::FsBlobStore;
pub use inline_transform::InlineImageTransform;
pub use memory::{MemoryBlobStore, MemoryEntryRepository, MemoryLedger, MemorySavedRepository};
pub use settings::SettingsStore;
pub use toml_history::{TomlEntryRepository, TomlLedgerRepository, TomlSavedRepository};
pub use toml_store::TomlStore;
