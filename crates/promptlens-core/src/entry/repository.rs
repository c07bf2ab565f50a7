//! Entry repository trait.
//!
//! Defines the interface for the remote-persisted history mirror.

use async_trait::async_trait;

use super::model::Entry;
use crate::error::Result;

/// An abstract repository for the remote chat-history mirror.
///
/// This trait decouples the coordinator from the storage mechanism (remote
/// document store, local files, in-memory doubles). Every operation is
/// independently failable; callers decide which failures are fatal and which
/// degrade to local-only mode.
#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Creates the remote record for a newly submitted entry.
    async fn create(&self, entry: &Entry) -> Result<()>;

    /// Updates the remote record in place (regenerate, settle, upload).
    async fn update(&self, entry: &Entry) -> Result<()>;

    /// Deletes one remote record (trimming).
    async fn delete(&self, id: &str) -> Result<()>;

    /// Returns the full remote snapshot in creation order.
    async fn list_all(&self) -> Result<Vec<Entry>>;

    /// Removes every record (new chat).
    async fn clear(&self) -> Result<()>;
}
