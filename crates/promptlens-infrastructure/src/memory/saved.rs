//! In-memory saved prompt repository.

use async_trait::async_trait;
use promptlens_core::error::Result;
use promptlens_core::saved::{SavedPrompt, SavedPromptRepository};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// In-memory remote-mirror double for saved prompts.
#[derive(Default)]
pub struct MemorySavedRepository {
    records: Mutex<BTreeMap<String, SavedPrompt>>,
}

impl MemorySavedRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SavedPromptRepository for MemorySavedRepository {
    async fn save(&self, item: &SavedPrompt) -> Result<()> {
        let mut records = self.records.lock().await;
        records.insert(item.id.clone(), item.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut records = self.records.lock().await;
        records.remove(id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<SavedPrompt>> {
        let records = self.records.lock().await;
        let mut items: Vec<SavedPrompt> = records.values().cloned().collect();
        items.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(items)
    }
}
