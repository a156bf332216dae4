//! Store error types.

use thiserror::Error;

/// Errors reported by record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No record exists under the given key.
    #[error("record not found: {0}")]
    NotFound(String),

    /// A record already exists under the given key.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// A conditional transition lost: the record's status no longer matches
    /// what the caller expected.
    #[error("stale status for {key}: expected one of [{expected}], found {actual}")]
    StaleStatus {
        key: String,
        expected: String,
        actual: String,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
