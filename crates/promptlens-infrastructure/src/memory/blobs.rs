//! In-memory blob store.

use async_trait::async_trait;
use promptlens_core::blob::BlobStore;
use promptlens_core::error::{PromptLensError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// In-memory blob store double. Uploads return `mem://` urls.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_uploads: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent uploads fail (tests the thumbnail-only degradation).
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    fn url_for(path: &str) -> String {
        format!("mem://{path}")
    }

    fn path_from(url: &str) -> Option<&str> {
        url.strip_prefix("mem://")
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, bytes: &[u8], path: &str) -> Result<String> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(PromptLensError::data_access("simulated upload failure"));
        }
        let mut blobs = self.blobs.lock().await;
        blobs.insert(path.to_string(), bytes.to_vec());
        Ok(Self::url_for(path))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let path = Self::path_from(url)
            .ok_or_else(|| PromptLensError::data_access(format!("not a mem:// url: {url}")))?;
        let blobs = self.blobs.lock().await;
        blobs
            .get(path)
            .cloned()
            .ok_or_else(|| PromptLensError::not_found("blob", path))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let mut blobs = self.blobs.lock().await;
        blobs.remove(path);
        Ok(())
    }
}
