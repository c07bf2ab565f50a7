//! Spend-confirmation gate.

use async_trait::async_trait;

/// Asks the user to approve a credit spend before an attempt starts.
///
/// Consulted only when `confirm_before_spend` is enabled. A declined
/// confirmation abandons the intent silently: no entry, no reservation.
#[async_trait]
pub trait ConfirmationGate: Send + Sync {
    async fn confirm_spend(&self, cost: u64) -> bool;
}

/// Gate that approves every spend.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

#[async_trait]
impl ConfirmationGate for AutoApprove {
    async fn confirm_spend(&self, _cost: u64) -> bool {
        true
    }
}
