//! Snapshot error types.

use promptvault_storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Document, version or object not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote tier used without being configured.
    #[error("Remote storage not configured: {0}")]
    Config(String),

    /// Missing or contradictory arguments.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Destination directory already exists.
    #[error("Target directory already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    /// Stored content is not valid YAML.
    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    /// Operation not possible in the current state (e.g. no versions yet).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Requested document field is absent.
    #[error("Field '{0}' not found in prompt")]
    FieldNotFound(String),

    /// IO error, passed through untouched.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Blob store error, passed through untouched.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl SnapshotError {
    /// Create a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Create a parse error for the given source path or key.
    pub fn parse(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            SnapshotError::not_found("Version 9.9.9").to_string(),
            "Not found: Version 9.9.9"
        );
        assert_eq!(
            SnapshotError::AlreadyExists(PathBuf::from("/tmp/out")).to_string(),
            "Target directory already exists: /tmp/out"
        );
        assert_eq!(
            SnapshotError::FieldNotFound("instructions".into()).to_string(),
            "Field 'instructions' not found in prompt"
        );
    }

    #[test]
    fn test_io_error_keeps_kind() {
        let err = SnapshotError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert_eq!(err.to_string(), "denied");
        assert!(matches!(
            err,
            SnapshotError::Io(ref e) if e.kind() == std::io::ErrorKind::PermissionDenied
        ));
    }

    #[test]
    fn test_storage_error_is_transparent() {
        let err = SnapshotError::from(StorageError::remote("boom"));
        assert_eq!(err.to_string(), "Remote store error: boom");
    }
}
