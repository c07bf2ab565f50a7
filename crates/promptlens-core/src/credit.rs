//! Credit ledger: authoritative remote balance mirrored locally.
//!
//! The local mirror exists for synchronous UI checks only. It may be briefly
//! stale and is never consulted inside the remote reservation; the remote
//! side re-reads and re-validates on every decrement.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of an authoritative ledger operation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerError {
    /// The authoritative balance, re-checked at decrement time, was below
    /// the reservation amount.
    #[error("insufficient credits: required {required}, balance {balance}")]
    Insufficient { required: u64, balance: u64 },

    /// The remote operation itself failed.
    #[error("ledger operation failed: {0}")]
    Remote(String),
}

/// The authoritative remote side of the ledger.
///
/// Both mutations must be a single-document atomic read-modify-write on the
/// remote store, never a local-balance-then-write.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Atomically decrements the remote balance, failing with
    /// [`LedgerError::Insufficient`] when it would go negative. Returns the
    /// new balance.
    async fn reserve(&self, amount: u64) -> Result<u64, LedgerError>;

    /// Atomically increments the remote balance, reversing a prior
    /// reservation. Returns the new balance.
    async fn refund(&self, amount: u64) -> Result<u64, LedgerError>;

    /// Reads the current remote balance (out-of-band, e.g. initial load).
    async fn fetch_balance(&self) -> Result<u64, LedgerError>;
}

/// Remote ledger plus a local mirror for synchronous checks.
pub struct CreditLedger {
    remote: Arc<dyn LedgerRepository>,
    mirror: AtomicU64,
}

impl CreditLedger {
    pub fn new(remote: Arc<dyn LedgerRepository>) -> Self {
        Self {
            remote,
            mirror: AtomicU64::new(0),
        }
    }

    /// The locally mirrored balance. May be briefly stale.
    pub fn balance(&self) -> u64 {
        self.mirror.load(Ordering::SeqCst)
    }

    /// Synchronous pre-flight check against the local mirror. Not
    /// authoritative; `reserve` re-validates remotely.
    pub fn has_enough(&self, amount: u64) -> bool {
        self.balance() >= amount
    }

    /// Overwrites the local mirror from an out-of-band read. Never writes
    /// remotely.
    pub fn set_balance(&self, value: u64) {
        self.mirror.store(value, Ordering::SeqCst);
    }

    /// Re-reads the remote balance into the mirror.
    pub async fn sync(&self) -> Result<u64, LedgerError> {
        let balance = self.remote.fetch_balance().await?;
        self.set_balance(balance);
        Ok(balance)
    }

    /// Authoritative reservation; on success the mirror is updated to the
    /// returned balance.
    pub async fn reserve(&self, amount: u64) -> Result<u64, LedgerError> {
        let new_balance = self.remote.reserve(amount).await?;
        self.set_balance(new_balance);
        Ok(new_balance)
    }

    /// Authoritative refund; on success the mirror is updated. Callers must
    /// not block status transitions on a refund failure; credits may be
    /// transiently understated (accepted eventual-consistency gap).
    pub async fn refund(&self, amount: u64) -> Result<u64, LedgerError> {
        let new_balance = self.remote.refund(amount).await?;
        self.set_balance(new_balance);
        Ok(new_balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    struct FakeLedger {
        balance: Mutex<u64>,
    }

    #[async_trait]
    impl LedgerRepository for FakeLedger {
        async fn reserve(&self, amount: u64) -> Result<u64, LedgerError> {
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
            let mut balance = self.balance.lock().await;
            *balance += amount;
            Ok(*balance)
        }

        async fn fetch_balance(&self) -> Result<u64, LedgerError> {
            Ok(*self.balance.lock().await)
        }
    }

    fn ledger_with(balance: u64) -> CreditLedger {
        CreditLedger::new(Arc::new(FakeLedger {
            balance: Mutex::new(balance),
        }))
    }

    #[tokio::test]
    async fn reserve_updates_mirror() {
        let ledger = ledger_with(10_000);
        ledger.sync().await.unwrap();
        assert!(ledger.has_enough(10));

        let new_balance = ledger.reserve(10).await.unwrap();
        assert_eq!(new_balance, 9_990);
        assert_eq!(ledger.balance(), 9_990);
    }

    #[tokio::test]
    async fn reserve_fails_against_authoritative_balance() {
        let ledger = ledger_with(5);
        // Mirror deliberately stale: the remote re-check must still reject.
        ledger.set_balance(100);
        assert!(ledger.has_enough(10));

        let err = ledger.reserve(10).await.unwrap_err();
        assert_eq!(
            err,
            LedgerError::Insufficient {
                required: 10,
                balance: 5
            }
        );
    }

    #[tokio::test]
    async fn refund_restores_balance() {
        let ledger = ledger_with(100);
        ledger.sync().await.unwrap();
        ledger.reserve(10).await.unwrap();
        let restored = ledger.refund(10).await.unwrap();
        assert_eq!(restored, 100);
        assert_eq!(ledger.balance(), 100);
    }
}
