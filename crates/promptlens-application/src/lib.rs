//! Use-case layer for PromptLens.
//!
//! Coordinates the domain stores, the credit ledger, the transform gateway
//! and the storage adapters into the two user-facing services: generation
//! and saved prompts.

pub mod confirm;
pub mod generation_usecase;
pub mod notice;
pub mod saved_service;

pub use confirm::{AutoApprove, ConfirmationGate};
pub use generation_usecase::{GenerationUseCase, OFFLINE_MESSAGE, REGENERATE_FAILED_MESSAGE};
pub use notice::{Notice, NoticeCallback, discard_notices};
pub use saved_service::{SavedPromptService, ToggleOutcome};
