//! `balance` command.

use anyhow::Result;

use promptlens_core::credit::LedgerRepository;

use super::utils::Stack;

pub async fn show() -> Result<()> {
    let stack = Stack::open()?;
    let balance = stack.ledger.fetch_balance().await?;
    println!("Balance: {balance} credits");
    Ok(())
}
