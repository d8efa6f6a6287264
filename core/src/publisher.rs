//! Message broker publication boundary.
//!
//! Every admitted mutation produces a domain-change notification
//! `{action, reservation id}`. The publisher is the external broker leaf; the
//! publish queue in `reservas-runtime` wraps it with workers, retries and
//! backoff so delivery never blocks the mutation caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The mutation that produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishAction {
    /// A reservation was created.
    Create,
    /// A reservation was updated.
    Update,
    /// A reservation was deleted.
    Delete,
}

impl PublishAction {
    /// Wire representation of the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for PublishAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from a single publish attempt against the broker.
#[derive(Error, Debug, Clone)]
pub enum PublishError {
    /// Could not reach or configure the broker.
    #[error("broker connection failed: {0}")]
    ConnectionFailed(String),

    /// The broker rejected or timed out the delivery.
    #[error("publish failed for reserva '{id}': {reason}")]
    Failed {
        /// Reservation id carried by the message.
        id: String,
        /// Broker-reported reason.
        reason: String,
    },

    /// The notification payload could not be encoded.
    #[error("failed to encode publish payload: {0}")]
    Serialization(String),
}

/// A single delivery attempt of a domain-change notification.
///
/// Implementations perform exactly one attempt; retry and backoff live in the
/// publish queue, not here.
#[async_trait]
pub trait ReservationPublisher: Send + Sync {
    /// Deliver one `{action, reservation id}` notification.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError`] when the attempt fails; the caller decides
    /// whether to retry.
    async fn publish(&self, action: PublishAction, reservation_id: &str)
    -> Result<(), PublishError>;
}
