//! Storage-level error wrapper mapped into the core taxonomy.

use apiario_core::errors::{DatabaseError, Error};
use thiserror::Error as ThisError;

/// Diesel-facing errors; converted into `apiario_core::Error` at the
/// repository boundary so callers never see backend types.
#[derive(Debug, ThisError)]
pub enum StorageError {
    #[error("Query failed: {0}")]
    Query(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Query(e) => Error::Database(DatabaseError::Query(e.to_string())),
            StorageError::Pool(e) => Error::Database(DatabaseError::Pool(e.to_string())),
        }
    }
}
