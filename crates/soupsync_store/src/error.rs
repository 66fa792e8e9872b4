//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store contents could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The named soup has not been registered.
    #[error("soup not found: {0}")]
    SoupNotFound(String),

    /// The query cannot be executed.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A record cannot be stored.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// The store is unavailable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
