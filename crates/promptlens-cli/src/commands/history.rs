//! `history` and `clear` commands.

use anyhow::Result;

use promptlens_core::blob::{BlobStore, entry_image_path};
use promptlens_core::entry::EntryRepository;

use super::utils::{self, Stack};

pub async fn list() -> Result<()> {
    let stack = Stack::open()?;
    let entries = stack.entries.list_all().await?;
    if entries.is_empty() {
        println!("History is empty.");
        return Ok(());
    }
    for entry in &entries {
        utils::print_entry(entry);
    }
    Ok(())
}

pub async fn clear() -> Result<()> {
    let stack = Stack::open()?;
    let entries = stack.entries.list_all().await?;
    for entry in &entries {
        if entry.image_ref.is_some() {
            let _ = stack.blobs.delete(&entry_image_path(&entry.id)).await;
        }
    }
    stack.entries.clear().await?;
    println!("History cleared ({} entries).", entries.len());
    Ok(())
}
