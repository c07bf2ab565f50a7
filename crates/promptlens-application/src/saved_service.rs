//! Saved prompt management: toggle, delete with undo, remote sync.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::warn;

use promptlens_core::blob::{BlobStore, saved_image_path};
use promptlens_core::entry::{Entry, GenerationStatus};
use promptlens_core::error::Result;
use promptlens_core::saved::{SavedPrompt, SavedPromptRepository, SavedPromptStore};

use crate::notice::{Notice, NoticeCallback};

/// Outcome of a toggle intent.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// The entry was saved.
    Saved(SavedPrompt),
    /// The entry was already saved and has been removed.
    Removed,
    /// The entry is not saveable (not done, or no prompt).
    Ignored,
}

/// Manages the saved prompt collection.
///
/// Saves are optimistic: the local store is updated first and rolled back
/// when the remote write fails. The saved image is an independent remote
/// copy, so the source entry's lifecycle (trim, clear, regenerate) cannot
/// corrupt a saved prompt.
pub struct SavedPromptService {
    store: Mutex<SavedPromptStore>,
    repo: Arc<dyn SavedPromptRepository>,
    blobs: Arc<dyn BlobStore>,
    notices: NoticeCallback,
}

impl SavedPromptService {
    pub fn new(
        undo_window: Duration,
        repo: Arc<dyn SavedPromptRepository>,
        blobs: Arc<dyn BlobStore>,
        notices: NoticeCallback,
    ) -> Self {
        Self {
            store: Mutex::new(SavedPromptStore::new(undo_window)),
            repo,
            blobs,
            notices,
        }
    }

    /// Replaces the local collection from the remote store.
    pub async fn refresh_from_remote(&self) -> Result<()> {
        let items = self.repo.list_all().await?;
        self.store.lock().await.replace_all(items);
        Ok(())
    }

    /// Snapshot of the collection, newest first.
    pub async fn items(&self) -> Vec<SavedPrompt> {
        self.store.lock().await.items().to_vec()
    }

    pub async fn is_saved(&self, id: &str) -> bool {
        self.store.lock().await.contains(id)
    }

    /// Saves the entry, or removes it when already saved.
    ///
    /// Only settled `done` entries with a prompt are saveable; anything else
    /// is ignored without touching any store.
    pub async fn toggle(&self, entry: &Entry) -> Result<ToggleOutcome> {
        if entry.status != GenerationStatus::Done {
            return Ok(ToggleOutcome::Ignored);
        }
        let Some(prompt) = entry.prompt.clone() else {
            return Ok(ToggleOutcome::Ignored);
        };

        let already_saved = {
            let mut store = self.store.lock().await;
            store.remove(&entry.id).is_some()
        };
        if already_saved {
            if let Err(e) = self.repo.delete(&entry.id).await {
                warn!(error = %e, id = %entry.id, "remote delete of saved prompt failed");
            }
            let _ = self.blobs.delete(&saved_image_path(&entry.id)).await;
            return Ok(ToggleOutcome::Removed);
        }

        let item = SavedPrompt {
            id: entry.id.clone(),
            prompt,
            image_ref: self.copy_image(entry).await,
            thumbnail: entry.thumbnail.clone(),
            saved_at: Utc::now(),
        };
        if !self.store.lock().await.insert(item.clone()) {
            return Ok(ToggleOutcome::Ignored);
        }
        if let Err(e) = self.repo.save(&item).await {
            // Roll the optimistic insert back; the save did not happen.
            self.store.lock().await.remove(&item.id);
            return Err(e);
        }
        Ok(ToggleOutcome::Saved(item))
    }

    /// Deletes a saved prompt, arming the undo window. Returns whether the
    /// item existed.
    ///
    /// A previously armed record is displaced and its delete becomes
    /// permanent, so its image copy is released here.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let (item, displaced) = {
            let mut store = self.store.lock().await;
            if !store.contains(id) {
                return Ok(false);
            }
            let displaced = store.disarm_undo();
            (store.remove_with_undo(id, Instant::now()), displaced)
        };
        self.release_saved_image(displaced).await;
        let Some(item) = item else {
            return Ok(false);
        };
        if let Err(e) = self.repo.delete(&item.id).await {
            warn!(error = %e, id = %item.id, "remote delete failed, undo still possible");
        }
        (self.notices)(Notice::SavedPromptDeleted { id: item.id });
        Ok(true)
    }

    /// Reverses the most recent delete, if its window is still open.
    ///
    /// The item returns to its original ordinal position (clamped to the
    /// current length) and the remote record is re-created. An expired
    /// record is finalized instead: its image copy is released.
    pub async fn undo(&self) -> Result<Option<SavedPrompt>> {
        let now = Instant::now();
        let (record, expired) = {
            let mut store = self.store.lock().await;
            let expired = store.expire_undo(now);
            (store.take_undo(now), expired)
        };
        self.release_saved_image(expired).await;
        let Some(record) = record else {
            return Ok(None);
        };
        let item = record.item.clone();
        if !self.store.lock().await.restore(record) {
            return Ok(None);
        }
        if let Err(e) = self.repo.save(&item).await {
            warn!(error = %e, id = %item.id, "remote re-create after undo failed");
        }
        Ok(Some(item))
    }

    /// Deletes the image copy of a delete that can no longer be undone.
    async fn release_saved_image(&self, item: Option<SavedPrompt>) {
        let Some(item) = item else { return };
        if item.image_ref.is_some() {
            let _ = self.blobs.delete(&saved_image_path(&item.id)).await;
        }
    }

    /// Copies the entry's uploaded image under the saved-prompt path.
    ///
    /// A failed copy degrades to the thumbnail; it never blocks the save.
    async fn copy_image(&self, entry: &Entry) -> Option<String> {
        let url = entry.image_ref.as_ref()?;
        let bytes = match self.blobs.download(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(error = %e, id = %entry.id, "source image download failed");
                return None;
            }
        };
        match self.blobs.upload(&bytes, &saved_image_path(&entry.id)).await {
            Ok(copied) => Some(copied),
            Err(e) => {
                warn!(error = %e, id = %entry.id, "saved image copy failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::discard_notices;
    use promptlens_core::blob::entry_image_path;
    use promptlens_core::saved::DEFAULT_UNDO_WINDOW;
    use promptlens_infrastructure::{MemoryBlobStore, MemorySavedRepository};

    struct Harness {
        service: SavedPromptService,
        repo: Arc<MemorySavedRepository>,
        blobs: Arc<MemoryBlobStore>,
    }

    fn harness(undo_window: Duration) -> Harness {
        let repo = Arc::new(MemorySavedRepository::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let service = SavedPromptService::new(
            undo_window,
            repo.clone(),
            blobs.clone(),
            discard_notices(),
        );
        Harness { service, repo, blobs }
    }

    fn done_entry(prompt: &str) -> Entry {
        let mut entry = Entry::new(Some("data:image/webp;base64,abc".into()));
        entry.complete(prompt);
        entry
    }

    /// Saves a fresh entry whose image copy lives in the blob store.
    async fn save_with_image(h: &Harness, prompt: &str) -> (Entry, String) {
        let mut entry = done_entry(prompt);
        let url = h
            .blobs
            .upload(b"image bytes", &entry_image_path(&entry.id))
            .await
            .unwrap();
        entry.image_ref = Some(url);
        let ToggleOutcome::Saved(item) = h.service.toggle(&entry).await.unwrap() else {
            panic!("expected a save");
        };
        (entry, item.image_ref.unwrap())
    }

    #[tokio::test]
    async fn toggle_is_involutive() {
        let h = harness(DEFAULT_UNDO_WINDOW);
        let entry = done_entry("A chair");

        let saved = h.service.toggle(&entry).await.unwrap();
        assert!(matches!(saved, ToggleOutcome::Saved(_)));
        assert!(h.service.is_saved(&entry.id).await);
        assert_eq!(h.repo.list_all().await.unwrap().len(), 1);

        let removed = h.service.toggle(&entry).await.unwrap();
        assert_eq!(removed, ToggleOutcome::Removed);
        assert!(!h.service.is_saved(&entry.id).await);
        assert!(h.repo.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn toggle_ignores_unsettled_entries() {
        let h = harness(DEFAULT_UNDO_WINDOW);

        let generating = Entry::new(None);
        assert_eq!(
            h.service.toggle(&generating).await.unwrap(),
            ToggleOutcome::Ignored
        );

        let mut stopped = Entry::new(None);
        stopped.stop();
        assert_eq!(
            h.service.toggle(&stopped).await.unwrap(),
            ToggleOutcome::Ignored
        );
        assert!(h.service.items().await.is_empty());
    }

    #[tokio::test]
    async fn save_copies_the_image_independently() {
        let h = harness(DEFAULT_UNDO_WINDOW);

        let mut entry = done_entry("A lamp");
        let source_url = h
            .blobs
            .upload(b"image bytes", &entry_image_path(&entry.id))
            .await
            .unwrap();
        entry.image_ref = Some(source_url.clone());

        let outcome = h.service.toggle(&entry).await.unwrap();
        let ToggleOutcome::Saved(item) = outcome else {
            panic!("expected a save");
        };
        let copy_url = item.image_ref.unwrap();
        assert_ne!(copy_url, source_url);

        // Deleting the source blob must not touch the saved copy.
        h.blobs.delete(&entry_image_path(&entry.id)).await.unwrap();
        assert_eq!(h.blobs.download(&copy_url).await.unwrap(), b"image bytes");
    }

    #[tokio::test]
    async fn delete_then_undo_restores_at_original_position() {
        let h = harness(DEFAULT_UNDO_WINDOW);
        let first = done_entry("first");
        let second = done_entry("second");
        let third = done_entry("third");
        h.service.toggle(&first).await.unwrap();
        h.service.toggle(&second).await.unwrap();
        h.service.toggle(&third).await.unwrap();

        assert!(h.service.delete(&second.id).await.unwrap());
        assert_eq!(h.repo.list_all().await.unwrap().len(), 2);

        let restored = h.service.undo().await.unwrap().unwrap();
        assert_eq!(restored.id, second.id);
        let ids: Vec<String> = h.service.items().await.into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![third.id.clone(), second.id.clone(), first.id.clone()]);
        assert_eq!(h.repo.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn undo_after_the_window_is_a_noop() {
        let h = harness(Duration::from_millis(1));
        let entry = done_entry("ephemeral");
        h.service.toggle(&entry).await.unwrap();

        h.service.delete(&entry.id).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(h.service.undo().await.unwrap().is_none());
        assert!(h.service.items().await.is_empty());
    }

    #[tokio::test]
    async fn expired_undo_releases_the_image_copy() {
        let h = harness(Duration::from_millis(1));
        let (entry, copy_url) = save_with_image(&h, "ephemeral").await;

        h.service.delete(&entry.id).await.unwrap();
        // While the window is open the copy must stay restorable.
        assert!(h.blobs.download(&copy_url).await.is_ok());
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(h.service.undo().await.unwrap().is_none());
        assert!(h.blobs.download(&copy_url).await.is_err());
    }

    #[tokio::test]
    async fn second_delete_finalizes_the_displaced_undo() {
        let h = harness(DEFAULT_UNDO_WINDOW);
        let (first, first_copy) = save_with_image(&h, "first").await;
        let (second, second_copy) = save_with_image(&h, "second").await;

        h.service.delete(&first.id).await.unwrap();
        h.service.delete(&second.id).await.unwrap();

        // The first delete is permanent now; only the second can come back.
        assert!(h.blobs.download(&first_copy).await.is_err());
        let restored = h.service.undo().await.unwrap().unwrap();
        assert_eq!(restored.id, second.id);
        assert!(h.blobs.download(&second_copy).await.is_ok());
    }

    #[tokio::test]
    async fn deleting_a_missing_item_is_a_noop() {
        let h = harness(DEFAULT_UNDO_WINDOW);
        assert!(!h.service.delete("missing").await.unwrap());
        assert!(h.service.undo().await.unwrap().is_none());
    }
}
