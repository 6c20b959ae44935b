//! Directory-backed blob store.
//!
//! Each object is stored as a regular file under a root directory.
//! Keys are mapped to file paths segment by segment:
//! `"prompts/Version 1.0.0/generic/tvpi.yaml"` -> `<root>/prompts/Version 1.0.0/generic/tvpi.yaml`
//!
//! Useful for a bucket mounted on the local filesystem and for exercising
//! the remote tier without network access.

use crate::{BlobStore, ObjectInfo, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use promptvault_util::path::to_slash_relative;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Directory-backed blob store.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a new store rooted at the given directory.
    ///
    /// The directory does not need to exist until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the file path for a key.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::invalid_key("Key cannot be empty"));
        }

        // Validate key segments (no path traversal)
        let mut path = self.root.clone();
        for segment in key.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\')
            {
                return Err(StorageError::invalid_key(format!(
                    "Invalid key segment in {key:?}: {segment:?}"
                )));
            }
            path.push(segment);
        }

        Ok(path)
    }

    /// Directory that contains every object of a prefix.
    ///
    /// `"p/Version "` only shares the `p/` directory with its objects, so the
    /// walk starts there and keys are filtered afterwards.
    fn prefix_to_dir(&self, prefix: &str) -> PathBuf {
        let mut path = self.root.clone();
        if let Some((dirs, _)) = prefix.rsplit_once('/') {
            for segment in dirs.split('/').filter(|s| !s.is_empty()) {
                path.push(segment);
            }
        }
        path
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        let dir = self.prefix_to_dir(prefix);
        debug!(path = %dir.display(), prefix, "Listing blob store");

        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for entry in walkdir::WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let Some(key) = to_slash_relative(entry.path(), &self.root) else {
                warn!(path = %entry.path().display(), "Skipping object with non UTF-8 path");
                continue;
            };
            if !key.starts_with(prefix) {
                continue;
            }

            let metadata = entry.metadata().map_err(std::io::Error::from)?;
            let updated = metadata.modified().ok().map(DateTime::<Utc>::from);
            results.push(ObjectInfo {
                key,
                size: metadata.len(),
                updated,
                content_type: None,
            });
        }

        Ok(results)
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), "Reading object");

        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        let path = self.key_to_path(key)?;
        debug!(path = %path.display(), bytes = data.len(), "Writing object");

        // Create parent directories
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&path, data).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(key)?;
        Ok(fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false))
    }

    async fn delete_tree(&self, prefix: &str) -> StorageResult<usize> {
        let objects = self.list(prefix).await?;
        for object in &objects {
            let path = self.key_to_path(&object.key)?;
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(StorageError::Io(e)),
            }
        }

        // A prefix ending at a segment boundary owns its whole directory
        if prefix.ends_with('/') {
            let dir = self.prefix_to_dir(prefix);
            if dir != self.root && dir.is_dir() {
                fs::remove_dir_all(&dir).await?;
            }
        }

        debug!(prefix, deleted = objects.len(), "Deleted objects");
        Ok(objects.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_put_and_get() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store
            .put("p/Version 1.0.0/generic/tvpi.yaml", b"tvpi: {}".to_vec())
            .await
            .unwrap();

        assert!(dir
            .path()
            .join("p/Version 1.0.0/generic/tvpi.yaml")
            .is_file());
        let data = store.get("p/Version 1.0.0/generic/tvpi.yaml").await.unwrap();
        assert_eq!(data, Some(b"tvpi: {}".to_vec()));
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        assert_eq!(store.get("nonexistent").await.unwrap(), None);
        assert!(!store.exists("nonexistent").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_with_partial_segment_prefix() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store.put("p/Version 1.0.0/a.yaml", b"a".to_vec()).await.unwrap();
        store.put("p/Version 2.0.0/b/c.yaml", b"bc".to_vec()).await.unwrap();
        store.put("p/other.txt", b"x".to_vec()).await.unwrap();

        let listed = store.list("p/Version ").await.unwrap();
        let keys: Vec<&str> = listed.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["p/Version 1.0.0/a.yaml", "p/Version 2.0.0/b/c.yaml"]);
        assert_eq!(listed[1].size, 2);
        assert!(listed[0].updated.is_some());
    }

    #[tokio::test]
    async fn test_list_missing_prefix_is_empty() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path().join("never-created"));

        assert!(store.list("p/Version ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_tree() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store.put("p/Version 1.0.0/a.yaml", b"a".to_vec()).await.unwrap();
        store.put("p/Version 1.0.0/b/c.yaml", b"c".to_vec()).await.unwrap();
        store.put("p/Version 1.1.0/a.yaml", b"a".to_vec()).await.unwrap();

        let deleted = store.delete_tree("p/Version 1.0.0/").await.unwrap();
        assert_eq!(deleted, 2);
        assert!(!dir.path().join("p/Version 1.0.0").exists());
        assert!(store.exists("p/Version 1.1.0/a.yaml").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_key() {
        let dir = tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        // Empty key
        assert!(store.put("", b"x".to_vec()).await.is_err());

        // Path traversal attempt
        assert!(store.put("../etc/passwd", b"x".to_vec()).await.is_err());

        // Empty segment
        assert!(store.put("p//a.yaml", b"x".to_vec()).await.is_err());

        // Directory marker
        assert!(store.put("p/Version 1.0.0/", b"".to_vec()).await.is_err());
    }
}
