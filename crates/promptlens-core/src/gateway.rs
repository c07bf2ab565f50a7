//! Transform gateway trait and failure classification.
//!
//! The gateway wraps the external generation call as a single cancellable
//! operation. It emits informational phase labels through an unbounded
//! channel (never blocking completion on delivery) and resolves to generated
//! text or a classified failure. It must not touch the ledger or any store.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::image::ImagePayload;

/// Channel end the gateway pushes progress-phase labels into.
pub type PhaseSink = UnboundedSender<String>;

/// Classified failure of a generation attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayError {
    /// Cancellation was requested before completion. Not user-visible as an
    /// error.
    #[error("generation aborted")]
    Aborted,

    /// The provider refuses to serve the caller's region.
    #[error("user location is not supported")]
    LocationRestricted,

    /// The API credential was rejected.
    #[error("invalid credential: {0}")]
    CredentialInvalid(String),

    /// The request was authenticated but denied.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Transport failure or any unclassifiable error.
    #[error("network error: {0}")]
    Network(String),
}

/// User-facing category a gateway failure maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// User-initiated stop; not phrased as an error.
    NotAnError,
    /// Worth retrying as-is.
    Retryable,
    /// Worth retrying from a different network.
    RetryableDifferentNetwork,
    /// Misconfiguration; retrying will not help.
    Configuration,
}

impl GatewayError {
    /// Maps the failure to its user-facing category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Aborted => ErrorCategory::NotAnError,
            Self::LocationRestricted => ErrorCategory::RetryableDifferentNetwork,
            Self::CredentialInvalid(_) | Self::Forbidden(_) => ErrorCategory::Configuration,
            Self::Network(_) => ErrorCategory::Retryable,
        }
    }

    /// A short human-readable message suitable as an entry's prompt text
    /// while the entry sits in a terminal error state.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Aborted => "Generation stopped",
            Self::LocationRestricted => {
                "Generation is not available from your current network. Try a different one."
            }
            Self::CredentialInvalid(_) | Self::Forbidden(_) => {
                "Could not generate prompt from this image."
            }
            Self::Network(_) => "Something went wrong. Try again?",
        }
    }
}

/// Cancellable wrapper around the external generation call.
///
/// Contract:
/// - zero or more phase labels are sent in emission order before completion;
///   none may be sent after `cancel` is signaled,
/// - once `cancel` is signaled the call settles with [`GatewayError::Aborted`]
///   in bounded time, without waiting for the underlying transport,
/// - no side effects beyond the network call itself.
#[async_trait]
pub trait TransformGateway: Send + Sync {
    async fn generate(
        &self,
        image: &ImagePayload,
        phases: PhaseSink,
        cancel: CancellationToken,
    ) -> std::result::Result<String, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_maps_to_categories() {
        assert_eq!(GatewayError::Aborted.category(), ErrorCategory::NotAnError);
        assert_eq!(
            GatewayError::LocationRestricted.category(),
            ErrorCategory::RetryableDifferentNetwork
        );
        assert_eq!(
            GatewayError::CredentialInvalid("bad key".into()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            GatewayError::Forbidden("denied".into()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            GatewayError::Network("timeout".into()).category(),
            ErrorCategory::Retryable
        );
    }
}
