//! User-visible notices delivered through an injected callback.
//!
//! Notices are non-blocking and informational. Each intent emits at most one;
//! outcomes already visible on the entry itself (the stopped marker, an error
//! prompt) carry their notice as a complement, not a duplicate channel for
//! errors the caller received as `Err`.

use std::sync::Arc;

use promptlens_core::gateway::ErrorCategory;

/// A non-blocking, user-visible event.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// An in-flight attempt was stopped at the user's request.
    GenerationStopped,
    /// An attempt settled in the error state.
    GenerationFailed {
        category: ErrorCategory,
        message: String,
    },
    /// The image upload failed; the entry keeps its local thumbnail only.
    PersistenceDegraded,
    /// A saved prompt was deleted and can be undone within the window.
    SavedPromptDeleted { id: String },
}

/// Injected sink for notices.
pub type NoticeCallback = Arc<dyn Fn(Notice) + Send + Sync>;

/// A callback that drops every notice. Useful for headless wiring and tests.
pub fn discard_notices() -> NoticeCallback {
    Arc::new(|_| {})
}
