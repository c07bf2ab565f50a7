//! In-memory entry repository.

use async_trait::async_trait;
use promptlens_core::entry::{Entry, EntryRepository};
use promptlens_core::error::Result;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

/// In-memory remote-mirror double for chat entries.
///
/// Keyed storage with creation-order listing; used as the remote document
/// store stand-in in tests and offline runs.
#[derive(Default)]
pub struct MemoryEntryRepository {
    records: Mutex<BTreeMap<String, Entry>>,
}

impl MemoryEntryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryRepository for MemoryEntryRepository {
    async fn create(&self, entry: &Entry) -> Result<()> {
        let mut records = self.records.lock().await;
        records.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn update(&self, entry: &Entry) -> Result<()> {
        let mut records = self.records.lock().await;
        records.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut records = self.records.lock().await;
        records.remove(id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Entry>> {
        let records = self.records.lock().await;
        let mut entries: Vec<Entry> = records.values().cloned().collect();
        entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(entries)
    }

    async fn clear(&self) -> Result<()> {
        let mut records = self.records.lock().await;
        records.clear();
        Ok(())
    }
}
