//! In-memory storage adapters.
//!
//! Remote-store doubles with the same contracts as the real collaborators:
//! keyed documents, atomic read-modify-write for the ledger, url-addressed
//! blobs. Used by tests and offline runs.

mod blobs;
mod entries;
mod ledger;
mod saved;

pub use blobs::MemoryBlobStore;
pub use entries::MemoryEntryRepository;
pub use ledger::MemoryLedger;
pub use saved::MemorySavedRepository;
