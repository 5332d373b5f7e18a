//! # Store Errors
//!
//! Error types for the store client interface.

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Failures talking to the key-value backend
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No connection could be checked out of the pool
    #[error("pool error: {0}")]
    Pool(String),

    /// The connection failed while sending or receiving
    #[error("connection error: {0}")]
    Connection(String),

    /// The backend replied with something unexpected
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The transaction was rejected or aborted
    #[error("transaction error: {0}")]
    Transaction(String),

    /// The backend did not answer a liveness probe
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
