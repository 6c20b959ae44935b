//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur while talking to a blob store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error (permission denied, disk full, ...). Kept transparent so the
    /// underlying `ErrorKind` reaches the caller unchanged.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Invalid object key
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Error reported by a remote object store
    #[error("Remote store error: {0}")]
    Remote(String),

    /// Lock was poisoned (another thread panicked while holding the lock)
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl StorageError {
    /// Create an invalid key error.
    pub fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey(message.into())
    }

    /// Create a remote store error.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }
}
