//! `generate` and `regenerate` commands.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use super::utils::{self, Stack};

pub async fn run(file: &Path, cancel_after_ms: Option<u64>) -> Result<()> {
    let stack = Stack::open()?;
    let usecase = stack.generation_usecase()?;
    usecase.refresh_from_remote().await?;

    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;

    if let Some(ms) = cancel_after_ms {
        let canceller = Arc::clone(&usecase);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            canceller.cancel().await;
        });
    }

    match usecase.submit(bytes).await? {
        Some(entry) => {
            utils::print_entry(&entry);
            println!("Balance: {} credits", usecase.balance());
        }
        None => println!("Generation skipped."),
    }
    Ok(())
}

pub async fn regenerate(id: &str) -> Result<()> {
    let stack = Stack::open()?;
    let usecase = stack.generation_usecase()?;
    usecase.refresh_from_remote().await?;

    match usecase.regenerate(id).await? {
        Some(entry) => {
            utils::print_entry(&entry);
            println!("Balance: {} credits", usecase.balance());
        }
        None => println!("Generation skipped."),
    }
    Ok(())
}
