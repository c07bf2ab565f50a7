//! `saved` subcommands.

use anyhow::{Result, bail};

use promptlens_application::ToggleOutcome;
use promptlens_core::entry::EntryRepository;

use super::utils::Stack;

pub async fn list() -> Result<()> {
    let stack = Stack::open()?;
    let service = stack.saved_service();
    service.refresh_from_remote().await?;

    let items = service.items().await;
    if items.is_empty() {
        println!("No saved prompts.");
        return Ok(());
    }
    for item in items {
        println!("{} ({})", item.id, item.saved_at.format("%Y-%m-%d %H:%M"));
        println!("  {}", item.prompt);
    }
    Ok(())
}

pub async fn toggle(id: &str) -> Result<()> {
    let stack = Stack::open()?;
    let service = stack.saved_service();
    service.refresh_from_remote().await?;

    let entries = stack.entries.list_all().await?;
    let Some(entry) = entries.into_iter().find(|e| e.id == id) else {
        bail!("no history entry with id {id}");
    };
    match service.toggle(&entry).await? {
        ToggleOutcome::Saved(item) => println!("Saved: {}", item.prompt),
        ToggleOutcome::Removed => println!("Removed from saved prompts."),
        ToggleOutcome::Ignored => println!("Entry has no finished prompt to save."),
    }
    Ok(())
}

pub async fn delete(id: &str) -> Result<()> {
    let stack = Stack::open()?;
    let service = stack.saved_service();
    service.refresh_from_remote().await?;

    if !service.delete(id).await? {
        bail!("no saved prompt with id {id}");
    }
    Ok(())
}
