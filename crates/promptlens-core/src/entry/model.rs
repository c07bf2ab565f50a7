//! Chat entry domain model and its generation state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed prompt text for entries whose attempt was cancelled.
pub const STOPPED_PROMPT: &str = "Generation stopped";

/// Generation lifecycle state of an entry.
///
/// `Generating` is the sole initial state. The three remaining states are
/// terminal for the attempt but not for the entry: a regenerate intent moves
/// a terminal entry back to `Generating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Generating,
    Done,
    Stopped,
    Error,
}

/// One row in the chat history: an uploaded image paired with its generated
/// prompt and status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Opaque stable identifier assigned at creation.
    pub id: String,
    /// Local preview as a `data:` URI; fallback until the blob upload lands.
    pub thumbnail: Option<String>,
    /// Remote blob reference once the image upload completed.
    pub image_ref: Option<String>,
    /// Generated text, or a human-readable error/status string while not
    /// `Done`.
    pub prompt: Option<String>,
    pub status: GenerationStatus,
    /// Progress-phase labels of the current/most recent attempt, in emission
    /// order. Cleared on regenerate.
    #[serde(default)]
    pub phases: Vec<String>,
    /// Creation timestamp, used for ordering and retention.
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Creates a new entry in the `Generating` state. There is no other way
    /// to construct one.
    pub fn new(thumbnail: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            thumbnail,
            image_ref: None,
            prompt: None,
            status: GenerationStatus::Generating,
            phases: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Whether the current attempt has settled.
    pub fn is_terminal(&self) -> bool {
        self.status != GenerationStatus::Generating
    }

    /// The authoritative display image: the uploaded blob when present,
    /// otherwise the local thumbnail.
    pub fn display_image(&self) -> Option<&str> {
        self.image_ref.as_deref().or(self.thumbnail.as_deref())
    }

    /// Appends a progress phase for the in-flight attempt.
    pub fn push_phase(&mut self, phase: impl Into<String>) {
        self.phases.push(phase.into());
    }

    /// `Generating -> Done`. Returns whether the transition applied.
    ///
    /// The boolean return is what makes refunds single-shot: the first caller
    /// to move an entry out of `Generating` owns the follow-up side effects.
    pub fn complete(&mut self, text: impl Into<String>) -> bool {
        if self.status != GenerationStatus::Generating {
            return false;
        }
        self.status = GenerationStatus::Done;
        self.prompt = Some(text.into());
        true
    }

    /// `Generating -> Stopped`. Returns whether the transition applied.
    pub fn stop(&mut self) -> bool {
        if self.status != GenerationStatus::Generating {
            return false;
        }
        self.status = GenerationStatus::Stopped;
        self.prompt = Some(STOPPED_PROMPT.to_string());
        true
    }

    /// `Generating -> Error` with a user-readable message. Returns whether
    /// the transition applied.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if self.status != GenerationStatus::Generating {
            return false;
        }
        self.status = GenerationStatus::Error;
        self.prompt = Some(message.into());
        true
    }

    /// Terminal -> `Generating` for a regenerate intent: phases cleared,
    /// prompt nulled. Returns whether the transition applied.
    pub fn restart(&mut self) -> bool {
        if self.status == GenerationStatus::Generating {
            return false;
        }
        self.status = GenerationStatus::Generating;
        self.prompt = None;
        self.phases.clear();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entry_is_generating() {
        let entry = Entry::new(None);
        assert_eq!(entry.status, GenerationStatus::Generating);
        assert!(entry.prompt.is_none());
        assert!(!entry.is_terminal());
    }

    #[test]
    fn complete_sets_prompt_and_is_single_shot() {
        let mut entry = Entry::new(None);
        assert!(entry.complete("A chair..."));
        assert_eq!(entry.status, GenerationStatus::Done);
        assert_eq!(entry.prompt.as_deref(), Some("A chair..."));
        // Terminal states reject further attempt transitions.
        assert!(!entry.stop());
        assert!(!entry.fail("boom"));
        assert!(!entry.complete("again"));
    }

    #[test]
    fn stop_sets_fixed_marker() {
        let mut entry = Entry::new(None);
        assert!(entry.stop());
        assert_eq!(entry.prompt.as_deref(), Some(STOPPED_PROMPT));
        assert_eq!(entry.status, GenerationStatus::Stopped);
    }

    #[test]
    fn restart_clears_attempt_state() {
        let mut entry = Entry::new(Some("data:image/png;base64,".into()));
        entry.push_phase("Sending request…");
        entry.fail("Something went wrong. Try again?");
        assert!(entry.restart());
        assert_eq!(entry.status, GenerationStatus::Generating);
        assert!(entry.prompt.is_none());
        assert!(entry.phases.is_empty());
        // Restarting an in-flight entry is not a transition.
        assert!(!entry.restart());
    }

    #[test]
    fn display_image_prefers_remote_ref() {
        let mut entry = Entry::new(Some("data:image/webp;base64,xyz".into()));
        assert_eq!(entry.display_image(), Some("data:image/webp;base64,xyz"));
        entry.image_ref = Some("mem://images/abc.webp".into());
        assert_eq!(entry.display_image(), Some("mem://images/abc.webp"));
    }
}
