//! TOML-file-backed repositories for local persistence.
//!
//! One document per collection. The coordinator is the only writer, so a
//! process-wide async mutex per document is sufficient for the ledger's
//! read-modify-write guarantee.

use async_trait::async_trait;
use promptlens_core::credit::{LedgerError, LedgerRepository};
use promptlens_core::entry::{Entry, EntryRepository};
use promptlens_core::error::Result;
use promptlens_core::saved::{SavedPrompt, SavedPromptRepository};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

use crate::toml_store::TomlStore;

#[derive(Debug, Default, Serialize, Deserialize)]
struct EntryDocument {
    #[serde(default)]
    entries: Vec<Entry>,
}

/// File-backed `EntryRepository` (history.toml).
pub struct TomlEntryRepository {
    store: Mutex<TomlStore<EntryDocument>>,
}

impl TomlEntryRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: Mutex::new(TomlStore::new(path)),
        }
    }
}

#[async_trait]
impl EntryRepository for TomlEntryRepository {
    async fn create(&self, entry: &Entry) -> Result<()> {
        let store = self.store.lock().await;
        let mut doc = store.load()?;
        doc.entries.retain(|e| e.id != entry.id);
        doc.entries.push(entry.clone());
        store.save(&doc)
    }

    async fn update(&self, entry: &Entry) -> Result<()> {
        self.create(entry).await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let store = self.store.lock().await;
        let mut doc = store.load()?;
        doc.entries.retain(|e| e.id != id);
        store.save(&doc)
    }

    async fn list_all(&self) -> Result<Vec<Entry>> {
        let store = self.store.lock().await;
        let mut doc = store.load()?;
        doc.entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(doc.entries)
    }

    async fn clear(&self) -> Result<()> {
        let store = self.store.lock().await;
        store.save(&EntryDocument::default())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SavedDocument {
    #[serde(default)]
    items: Vec<SavedPrompt>,
}

/// File-backed `SavedPromptRepository` (saved.toml).
pub struct TomlSavedRepository {
    store: Mutex<TomlStore<SavedDocument>>,
}

impl TomlSavedRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: Mutex::new(TomlStore::new(path)),
        }
    }
}

#[async_trait]
impl SavedPromptRepository for TomlSavedRepository {
    async fn save(&self, item: &SavedPrompt) -> Result<()> {
        let store = self.store.lock().await;
        let mut doc = store.load()?;
        doc.items.retain(|p| p.id != item.id);
        doc.items.push(item.clone());
        store.save(&doc)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let store = self.store.lock().await;
        let mut doc = store.load()?;
        doc.items.retain(|p| p.id != id);
        store.save(&doc)
    }

    async fn list_all(&self) -> Result<Vec<SavedPrompt>> {
        let store = self.store.lock().await;
        let mut doc = store.load()?;
        doc.items.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(doc.items)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LedgerDocument {
    balance: u64,
}

impl Default for LedgerDocument {
    fn default() -> Self {
        Self { balance: 0 }
    }
}

/// File-backed authoritative ledger (credits.toml).
///
/// The document mutex spans the whole load-check-store cycle, giving the
/// single-document atomic update the reservation semantics require.
pub struct TomlLedgerRepository {
    store: Mutex<TomlStore<LedgerDocument>>,
    initial_balance: u64,
}

impl TomlLedgerRepository {
    /// Opens the ledger file; a missing file is seeded with
    /// `initial_balance` on first access.
    pub fn new(path: impl Into<PathBuf>, initial_balance: u64) -> Self {
        Self {
            store: Mutex::new(TomlStore::new(path)),
            initial_balance,
        }
    }

    fn load_or_seed(&self, store: &TomlStore<LedgerDocument>) -> Result<LedgerDocument> {
        if store.path().exists() {
            store.load()
        } else {
            Ok(LedgerDocument {
                balance: self.initial_balance,
            })
        }
    }
}

#[async_trait]
impl LedgerRepository for TomlLedgerRepository {
    async fn reserve(&self, amount: u64) -> std::result::Result<u64, LedgerError> {
        let store = self.store.lock().await;
        let mut doc = self
            .load_or_seed(&store)
            .map_err(|e| LedgerError::Remote(e.to_string()))?;
        if doc.balance < amount {
            return Err(LedgerError::Insufficient {
                required: amount,
                balance: doc.balance,
            });
        }
        doc.balance -= amount;
        store
            .save(&doc)
            .map_err(|e| LedgerError::Remote(e.to_string()))?;
        Ok(doc.balance)
    }

    async fn refund(&self, amount: u64) -> std::result::Result<u64, LedgerError> {
        let store = self.store.lock().await;
        let mut doc = self
            .load_or_seed(&store)
            .map_err(|e| LedgerError::Remote(e.to_string()))?;
        doc.balance += amount;
        store
            .save(&doc)
            .map_err(|e| LedgerError::Remote(e.to_string()))?;
        Ok(doc.balance)
    }

    async fn fetch_balance(&self) -> std::result::Result<u64, LedgerError> {
        let store = self.store.lock().await;
        let doc = self
            .load_or_seed(&store)
            .map_err(|e| LedgerError::Remote(e.to_string()))?;
        // Seed the file so the first reservation sees the same balance.
        if !store.path().exists() {
            store
                .save(&doc)
                .map_err(|e| LedgerError::Remote(e.to_string()))?;
        }
        Ok(doc.balance)
    }
}
