//! Blob store collaborator trait.

use async_trait::async_trait;

use crate::error::Result;

/// External blob storage for uploaded images.
///
/// Uploads may fail independently of the generation outcome and must not be
/// treated as fatal; a failed upload degrades the entry to thumbnail-only
/// display.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores bytes under `path`, returning a stable download url.
    async fn upload(&self, bytes: &[u8], path: &str) -> Result<String>;

    /// Fetches the bytes behind a previously returned url.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;

    /// Removes the blob at `path`. Deleting a missing blob is a no-op.
    async fn delete(&self, path: &str) -> Result<()>;
}

/// Storage path for a chat entry's uploaded image.
pub fn entry_image_path(id: &str) -> String {
    format!("images/{id}.webp")
}

/// Storage path for a saved prompt's independent image copy.
pub fn saved_image_path(id: &str) -> String {
    format!("saved/{id}.webp")
}
