//! In-memory authoritative ledger.

use async_trait::async_trait;
use promptlens_core::credit::{LedgerError, LedgerRepository};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// In-memory authoritative ledger double.
///
/// The mutex makes reserve/refund a single-document atomic read-modify-write,
/// matching the only transactional primitive the remote store guarantees.
pub struct MemoryLedger {
    balance: Mutex<u64>,
    fail_remote: AtomicBool,
}

impl MemoryLedger {
    pub fn new(initial_balance: u64) -> Self {
        Self {
            balance: Mutex::new(initial_balance),
            fail_remote: AtomicBool::new(false),
        }
    }

    /// Makes subsequent remote operations fail (tests the degraded paths).
    pub fn set_fail_remote(&self, fail: bool) {
        self.fail_remote.store(fail, Ordering::SeqCst);
    }

    fn check_remote(&self) -> Result<(), LedgerError> {
        if self.fail_remote.load(Ordering::SeqCst) {
            return Err(LedgerError::Remote("simulated remote failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerRepository for MemoryLedger {
    async fn reserve(&self, amount: u64) -> Result<u64, LedgerError> {
        self.check_remote()?;
        let mut balance = self.balance.lock().await;
        if *balance < amount {
            return Err(LedgerError::Insufficient {
                required: amount,
                balance: *balance,
            });
        }
        *balance -= amount;
        Ok(*balance)
    }

    async fn refund(&self, amount: u64) -> Result<u64, LedgerError> {
        self.check_remote()?;
        let mut balance = self.balance.lock().await;
        *balance += amount;
        Ok(*balance)
    }

    async fn fetch_balance(&self) -> Result<u64, LedgerError> {
        self.check_remote()?;
        Ok(*self.balance.lock().await)
    }
}
