//! Error types shared across the apiario crates.

use thiserror::Error;

use crate::remote::RemoteError;

/// Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// Local persistence failures, as surfaced by the storage backend.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Connection pool exhausted or unavailable
    #[error("Connection pool error: {0}")]
    Pool(String),

    /// Query execution failed
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Anything else the storage layer cannot classify
    #[error("{0}")]
    Internal(String),
}

/// Preconditions a sync-dependent operation may find unmet.
///
/// These are expected, normal states. A sync pass treats them as a no-op;
/// only operations that hard-require the network (immediate deletes)
/// surface them as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precondition {
    Offline,
    NoIdentity,
    SyncDisabled,
}

impl std::fmt::Display for Precondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Precondition::Offline => write!(f, "no connectivity"),
            Precondition::NoIdentity => write!(f, "no authenticated identity"),
            Precondition::SyncDisabled => write!(f, "sync is disabled"),
        }
    }
}

/// Errors that can occur in the data/sync layer.
#[derive(Debug, Error)]
pub enum Error {
    /// Local store fault; rejects the calling operation
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Remote service fault during push, pull, or an immediate delete
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Connectivity or identity missing for an operation that requires them
    #[error("Precondition not met: {0}")]
    PreconditionNotMet(Precondition),

    /// Record payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller handed the facade an invalid record
    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True when the operation failed only because sync preconditions were unmet.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::PreconditionNotMet(_))
    }
}
