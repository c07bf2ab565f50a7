//! In-memory ordered collection of chat entries.
//!
//! The store is the optimistic local copy of the remote history mirror. All
//! mutation goes through the coordinator (single writer); reconciliation with
//! the remote mirror is an explicit merge with fixed precedence rules rather
//! than field-by-field overwrites.

use chrono::{DateTime, Duration, Utc};

use super::model::Entry;

/// Eviction policy applied on every append.
#[derive(Debug, Clone, Default)]
pub struct TrimPolicy {
    /// Maximum number of retained entries; oldest beyond the limit are
    /// evicted FIFO. `None` means unlimited.
    pub max_entries: Option<usize>,
    /// Retention window measured from `created_at`. `None` means never.
    pub max_age: Option<Duration>,
}

/// Ordered, append-only (except trimming) collection of entries.
#[derive(Debug, Default)]
pub struct EntryStore {
    entries: Vec<Entry>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a newly created entry.
    pub fn append(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Looks up an entry by id.
    pub fn get(&self, id: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Applies an in-place update to the entry with the given id.
    ///
    /// Returns `None` when no such entry exists, otherwise the closure's
    /// return value (transition helpers return whether they applied, so the
    /// caller can gate follow-up side effects on it).
    pub fn update<R>(&mut self, id: &str, f: impl FnOnce(&mut Entry) -> R) -> Option<R> {
        self.entries.iter_mut().find(|e| e.id == id).map(f)
    }

    /// All entries in creation order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes everything (new chat).
    pub fn clear(&mut self) -> Vec<Entry> {
        std::mem::take(&mut self.entries)
    }

    /// Applies capacity and age trimming, returning the evicted entries so
    /// the caller can issue best-effort remote deletions without blocking.
    pub fn trim(&mut self, policy: &TrimPolicy, now: DateTime<Utc>) -> Vec<Entry> {
        let mut evicted = Vec::new();

        if let Some(max_age) = policy.max_age {
            let cutoff = now - max_age;
            let mut kept = Vec::with_capacity(self.entries.len());
            for entry in self.entries.drain(..) {
                if entry.created_at < cutoff {
                    evicted.push(entry);
                } else {
                    kept.push(entry);
                }
            }
            self.entries = kept;
        }

        if let Some(max_entries) = policy.max_entries {
            if self.entries.len() > max_entries {
                let overflow = self.entries.len() - max_entries;
                evicted.extend(self.entries.drain(..overflow));
            }
        }

        evicted
    }

    /// Merges a remote snapshot into the local copy.
    ///
    /// Precedence: the remote record's persisted fields win, except a
    /// locally-held thumbnail is kept while the remote record carries neither
    /// an uploaded blob reference nor its own thumbnail. Local entries the
    /// remote store has not acknowledged yet are preserved.
    pub fn merge_remote(&mut self, remote: Vec<Entry>) {
        let mut merged: Vec<Entry> = Vec::with_capacity(remote.len());
        for mut record in remote {
            if let Some(local) = self.entries.iter().find(|e| e.id == record.id) {
                if record.image_ref.is_none() && record.thumbnail.is_none() {
                    record.thumbnail = local.thumbnail.clone();
                }
            }
            merged.push(record);
        }

        for local in self.entries.drain(..) {
            if !merged.iter().any(|e| e.id == local.id) {
                merged.push(local);
            }
        }

        merged.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        self.entries = merged;
    }
}
