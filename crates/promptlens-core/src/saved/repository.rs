//! Saved prompt repository trait.

use async_trait::async_trait;

use super::model::SavedPrompt;
use crate::error::Result;

/// An abstract repository for the remote saved-prompt mirror.
///
/// Saved records live in their own collection with an independent lifecycle;
/// implementations must not share blob storage with the chat-history mirror.
#[async_trait]
pub trait SavedPromptRepository: Send + Sync {
    /// Creates or re-creates the remote record (save, undo).
    async fn save(&self, item: &SavedPrompt) -> Result<()>;

    /// Deletes the remote record.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Returns the full remote snapshot, newest first.
    async fn list_all(&self) -> Result<Vec<SavedPrompt>>;
}
