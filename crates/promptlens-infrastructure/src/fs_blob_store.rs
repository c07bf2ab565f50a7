//! Directory-backed blob store.

use async_trait::async_trait;
use promptlens_core::blob::BlobStore;
use promptlens_core::error::{PromptLensError, Result};
use std::path::{Path, PathBuf};

/// Blob store over a local directory. Uploads return `file://` urls.
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    fn url_for(full: &Path) -> String {
        format!("file://{}", full.display())
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, bytes: &[u8], path: &str) -> Result<String> {
        let full = self.resolve(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                PromptLensError::io(format!("Failed to create {:?}: {}", parent, e))
            })?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .map_err(|e| PromptLensError::io(format!("Failed to write blob {:?}: {}", full, e)))?;
        Ok(Self::url_for(&full))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let path = url
            .strip_prefix("file://")
            .ok_or_else(|| PromptLensError::data_access(format!("not a file:// url: {url}")))?;
        tokio::fs::read(path)
            .await
            .map_err(|e| PromptLensError::io(format!("Failed to read blob {path}: {e}")))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full = self.resolve(path);
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PromptLensError::io(format!(
                "Failed to delete blob {:?}: {}",
                full, e
            ))),
        }
    }
}
