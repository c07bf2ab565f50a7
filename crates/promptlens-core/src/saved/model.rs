//! Saved prompt domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A user-pinned snapshot of an entry's result.
///
/// The id equals the source entry's id, so "is this entry saved" is a
/// membership test. The image storage is an independent copy: deleting or
/// mutating the source entry must not affect a saved prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPrompt {
    pub id: String,
    pub prompt: String,
    /// Independent remote copy of the image, when the upload succeeded.
    pub image_ref: Option<String>,
    /// Inline preview fallback.
    pub thumbnail: Option<String>,
    pub saved_at: DateTime<Utc>,
}

/// Ephemeral record enabling reversal of a delete within a bounded window.
#[derive(Debug, Clone)]
pub struct UndoRecord {
    pub item: SavedPrompt,
    /// Ordinal position the item held before deletion.
    pub index: usize,
    /// Point after which the delete becomes permanent.
    pub deadline: Instant,
}
