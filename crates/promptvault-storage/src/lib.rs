//! Blob store layer for promptvault.
//!
//! The remote tier of a prompt vault is a flat key space: objects are
//! addressed by `/`-separated keys and "directories" only exist as shared
//! key prefixes. This crate provides the abstraction and its backends:
//! - In-memory store (for testing)
//! - Directory-backed store (a local or mounted bucket)
//! - S3 / S3-compatible store

pub mod error;
pub mod fs;
pub mod memory;
pub mod s3;

pub use error::{StorageError, StorageResult};
pub use fs::FsBlobStore;
pub use memory::MemoryBlobStore;
pub use s3::{S3BlobStore, S3Credentials, S3Settings};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata of a stored object, as returned by a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Full object key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, if the backend reports one.
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    /// MIME type, if the backend reports one.
    #[serde(default)]
    pub content_type: Option<String>,
}

impl ObjectInfo {
    /// Create object metadata with only key and size known.
    pub fn new(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            updated: None,
            content_type: None,
        }
    }

    /// Whether this entry is a directory marker (`"a/b/"`) rather than a document.
    pub fn is_dir_marker(&self) -> bool {
        self.key.ends_with('/')
    }
}

/// A key-prefix object store.
///
/// Keys are plain strings such as `"prompts/Version 1.0.0/generic/tvpi.yaml"`.
/// Every call is a single round trip; implementations do not retry.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// List every object whose key starts with `prefix`.
    ///
    /// The order of the returned entries is unspecified.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>>;

    /// Read an object.
    ///
    /// Returns `None` if the key doesn't exist.
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Write an object, replacing any previous content.
    async fn put(&self, key: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Delete every object whose key starts with `prefix`.
    ///
    /// Returns the number of deleted objects.
    async fn delete_tree(&self, prefix: &str) -> StorageResult<usize>;
}
