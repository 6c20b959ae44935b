//! In-memory blob store for testing.

use crate::{BlobStore, ObjectInfo, StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::RwLock;

struct StoredObject {
    data: Vec<u8>,
    updated: DateTime<Utc>,
}

/// In-memory blob store for testing.
///
/// This stores all objects in memory and is not persistent.
pub struct MemoryBlobStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryBlobStore {
    /// Create a new, empty in-memory store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a store pre-populated with the given objects.
    pub fn with_objects<K, V>(objects: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Vec<u8>>,
    {
        let now = Utc::now();
        let objects = objects
            .into_iter()
            .map(|(key, data)| {
                (
                    key.into(),
                    StoredObject {
                        data: data.into(),
                        updated: now,
                    },
                )
            })
            .collect();
        Self {
            objects: RwLock::new(objects),
        }
    }

    /// All keys currently stored, in lexical order.
    pub fn keys(&self) -> StorageResult<Vec<String>> {
        let objects = self
            .objects
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(objects.keys().cloned().collect())
    }
}

impl Default for MemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        let objects = self
            .objects
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;

        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectInfo {
                key: key.clone(),
                size: object.data.len() as u64,
                updated: Some(object.updated),
                content_type: None,
            })
            .collect())
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let objects = self
            .objects
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(objects.get(key).map(|object| object.data.clone()))
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        if key.is_empty() {
            return Err(StorageError::invalid_key("Key cannot be empty"));
        }

        let mut objects = self
            .objects
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        objects.insert(
            key.to_string(),
            StoredObject {
                data,
                updated: Utc::now(),
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let objects = self
            .objects
            .read()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        Ok(objects.contains_key(key))
    }

    async fn delete_tree(&self, prefix: &str) -> StorageResult<usize> {
        let mut objects = self
            .objects
            .write()
            .map_err(|e| StorageError::LockPoisoned(e.to_string()))?;
        let before = objects.len();
        objects.retain(|key, _| !key.starts_with(prefix));
        Ok(before - objects.len())
    }
}
