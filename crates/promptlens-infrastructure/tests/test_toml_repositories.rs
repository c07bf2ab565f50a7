//! Integration tests for the TOML-backed repositories.

use chrono::Utc;
use promptlens_core::credit::{LedgerError, LedgerRepository};
use promptlens_core::entry::{Entry, EntryRepository};
use promptlens_core::saved::{SavedPrompt, SavedPromptRepository};
use promptlens_infrastructure::{TomlEntryRepository, TomlLedgerRepository, TomlSavedRepository};
use tempfile::TempDir;

#[tokio::test]
async fn entry_repository_round_trips_through_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("history.toml");

    let repo = TomlEntryRepository::new(&path);
    let mut entry = Entry::new(Some("data:image/webp;base64,abc".into()));
    entry.push_phase("Sending request…");
    repo.create(&entry).await.unwrap();

    entry.complete("A studio photograph of a wooden chair");
    repo.update(&entry).await.unwrap();

    // Re-open from disk to prove the state survived the process boundary.
    let reopened = TomlEntryRepository::new(&path);
    let listed = reopened.list_all().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], entry);
}

#[tokio::test]
async fn entry_repository_lists_in_creation_order() {
    let dir = TempDir::new().unwrap();
    let repo = TomlEntryRepository::new(dir.path().join("history.toml"));

    let mut older = Entry::new(None);
    older.created_at = Utc::now() - chrono::Duration::minutes(5);
    let newer = Entry::new(None);

    // Write newest first; list_all must still come back oldest first.
    repo.create(&newer).await.unwrap();
    repo.create(&older).await.unwrap();

    let listed = repo.list_all().await.unwrap();
    assert_eq!(listed[0].id, older.id);
    assert_eq!(listed[1].id, newer.id);
}

#[tokio::test]
async fn entry_repository_delete_and_clear() {
    let dir = TempDir::new().unwrap();
    let repo = TomlEntryRepository::new(dir.path().join("history.toml"));

    let a = Entry::new(None);
    let b = Entry::new(None);
    repo.create(&a).await.unwrap();
    repo.create(&b).await.unwrap();

    repo.delete(&a.id).await.unwrap();
    let listed = repo.list_all().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, b.id);

    repo.clear().await.unwrap();
    assert!(repo.list_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn saved_repository_round_trips_and_orders_newest_first() {
    let dir = TempDir::new().unwrap();
    let repo = TomlSavedRepository::new(dir.path().join("saved.toml"));

    let older = SavedPrompt {
        id: "one".into(),
        prompt: "An older prompt".into(),
        image_ref: None,
        thumbnail: None,
        saved_at: Utc::now() - chrono::Duration::hours(1),
    };
    let newer = SavedPrompt {
        id: "two".into(),
        prompt: "A newer prompt".into(),
        image_ref: Some("mem://saved/two.webp".into()),
        thumbnail: None,
        saved_at: Utc::now(),
    };
    repo.save(&older).await.unwrap();
    repo.save(&newer).await.unwrap();

    let listed = repo.list_all().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, "two");
    assert_eq!(listed[1].id, "one");

    repo.delete("two").await.unwrap();
    let listed = repo.list_all().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "one");
}

#[tokio::test]
async fn ledger_seeds_initial_balance_and_persists_reservations() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("credits.toml");

    let ledger = TomlLedgerRepository::new(&path, 10_000);
    assert_eq!(ledger.fetch_balance().await.unwrap(), 10_000);

    let remaining = ledger.reserve(10).await.unwrap();
    assert_eq!(remaining, 9_990);

    // A fresh handle over the same file must see the debited balance, not a
    // re-seeded one.
    let reopened = TomlLedgerRepository::new(&path, 10_000);
    assert_eq!(reopened.fetch_balance().await.unwrap(), 9_990);

    let restored = reopened.refund(10).await.unwrap();
    assert_eq!(restored, 10_000);
}

#[tokio::test]
async fn ledger_rejects_overdraft_without_writing() {
    let dir = TempDir::new().unwrap();
    let ledger = TomlLedgerRepository::new(dir.path().join("credits.toml"), 5);

    let err = ledger.reserve(10).await.unwrap_err();
    assert_eq!(
        err,
        LedgerError::Insufficient {
            required: 10,
            balance: 5
        }
    );
    assert_eq!(ledger.fetch_balance().await.unwrap(), 5);
}
