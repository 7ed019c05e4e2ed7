//! Remote table service contract consumed by the sync engine and the
//! optimistic write path.
//!
//! The concrete backend is external; implementations are expected to key
//! records by id and filter by owner server-side, so repeating an upsert is
//! always safe.

use async_trait::async_trait;
use thiserror::Error;

use crate::identity::Identity;
use crate::sync::EntityKind;

/// Retry policy classification for remote failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    Retryable,
    Permanent,
    ReauthRequired,
}

/// Errors surfaced by a remote table service implementation.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network-level failure (timeout, DNS, connection refused)
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("service error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Missing or rejected credentials
    #[error("authentication error: {0}")]
    Auth(String),
}

impl RemoteError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify error for retry policy.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Api { status, .. } => match *status {
                401 | 403 => RetryClass::ReauthRequired,
                408 | 409 | 423 | 425 | 429 => RetryClass::Retryable,
                500..=599 => RetryClass::Retryable,
                _ => RetryClass::Permanent,
            },
            Self::Transport(_) => RetryClass::Retryable,
            Self::Auth(_) => RetryClass::ReauthRequired,
        }
    }
}

/// Remote table service keyed by record id.
///
/// `identity` is `None` only when the engine runs in the no-auth variant;
/// implementations then fall back to their anonymous credentials.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Insert-or-overwrite one record in the remote table. Idempotent by id.
    async fn upsert(
        &self,
        identity: Option<&Identity>,
        kind: EntityKind,
        record: &serde_json::Value,
    ) -> Result<(), RemoteError>;

    /// Fetch the authoritative record set of one table for the identity.
    async fn fetch_all(
        &self,
        identity: Option<&Identity>,
        kind: EntityKind,
    ) -> Result<Vec<serde_json::Value>, RemoteError>;

    /// Remove one record. Resolves successfully when the record is already gone.
    async fn delete(
        &self,
        identity: Option<&Identity>,
        kind: EntityKind,
        id: &str,
    ) -> Result<(), RemoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_class_for_server_errors_is_retryable() {
        assert_eq!(
            RemoteError::api(500, "boom").retry_class(),
            RetryClass::Retryable
        );
        assert_eq!(
            RemoteError::api(429, "slow down").retry_class(),
            RetryClass::Retryable
        );
        assert_eq!(
            RemoteError::transport("timed out").retry_class(),
            RetryClass::Retryable
        );
    }

    #[test]
    fn retry_class_for_auth_errors_is_reauth() {
        assert_eq!(
            RemoteError::api(401, "unauthorized").retry_class(),
            RetryClass::ReauthRequired
        );
    }

    #[test]
    fn retry_class_for_client_errors_is_permanent() {
        assert_eq!(
            RemoteError::api(400, "bad payload").retry_class(),
            RetryClass::Permanent
        );
    }
}
