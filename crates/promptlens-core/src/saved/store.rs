//! In-memory saved prompt collection with delete-undo support.

use std::time::{Duration, Instant};

use super::model::{SavedPrompt, UndoRecord};

/// Default display lifetime of an undo record (5 s).
pub const DEFAULT_UNDO_WINDOW: Duration = Duration::from_millis(5000);

/// Ordered collection of saved prompts, newest first, with a single live
/// undo slot.
#[derive(Debug)]
pub struct SavedPromptStore {
    items: Vec<SavedPrompt>,
    undo: Option<UndoRecord>,
    undo_window: Duration,
}

impl Default for SavedPromptStore {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_WINDOW)
    }
}

impl SavedPromptStore {
    pub fn new(undo_window: Duration) -> Self {
        Self {
            items: Vec::new(),
            undo: None,
            undo_window,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|p| p.id == id)
    }

    pub fn items(&self) -> &[SavedPrompt] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Inserts a new item at the front (newest first). No-op when the id is
    /// already present; returns whether the insert happened.
    pub fn insert(&mut self, item: SavedPrompt) -> bool {
        if self.contains(&item.id) {
            return false;
        }
        self.items.insert(0, item);
        true
    }

    /// Removes an item by id, returning it with its original ordinal
    /// position. Removing a non-existent item is a no-op.
    pub fn remove(&mut self, id: &str) -> Option<(SavedPrompt, usize)> {
        let index = self.items.iter().position(|p| p.id == id)?;
        Some((self.items.remove(index), index))
    }

    /// Removes an item and arms the undo slot. Any previously armed record
    /// is discarded; its delete becomes permanent.
    pub fn remove_with_undo(&mut self, id: &str, now: Instant) -> Option<SavedPrompt> {
        let (item, index) = self.remove(id)?;
        self.undo = Some(UndoRecord {
            item: item.clone(),
            index,
            deadline: now + self.undo_window,
        });
        Some(item)
    }

    /// Consumes the undo slot if it is still live at `now`.
    ///
    /// An expired record is dropped and `None` returned: the delete is
    /// permanent once the window has elapsed.
    pub fn take_undo(&mut self, now: Instant) -> Option<UndoRecord> {
        let record = self.undo.take()?;
        if now > record.deadline {
            return None;
        }
        Some(record)
    }

    /// Drops the armed record unconditionally, making its delete permanent.
    /// Returns the item so callers can release anything it still holds.
    pub fn disarm_undo(&mut self) -> Option<SavedPrompt> {
        self.undo.take().map(|record| record.item)
    }

    /// Drops the armed record once its window has elapsed at `now`,
    /// returning the permanently deleted item. A live record stays armed.
    pub fn expire_undo(&mut self, now: Instant) -> Option<SavedPrompt> {
        if self.undo.as_ref().is_some_and(|record| now > record.deadline) {
            return self.disarm_undo();
        }
        None
    }

    /// Re-inserts an undone item at `min(original index, len)`, guarding
    /// against a list that shrank in the meantime. No-op when the id is
    /// already present (race with a fresh save under the same id); returns
    /// whether the restore happened.
    pub fn restore(&mut self, record: UndoRecord) -> bool {
        if self.contains(&record.item.id) {
            return false;
        }
        let index = record.index.min(self.items.len());
        self.items.insert(index, record.item);
        true
    }

    /// Replaces the whole collection from a remote snapshot.
    pub fn replace_all(&mut self, mut items: Vec<SavedPrompt>) {
        items.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        self.items = items;
    }
}
