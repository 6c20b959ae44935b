//! S3 blob store.
//!
//! Works against AWS S3 and S3-compatible services (R2, MinIO, ...) through
//! `aws-sdk-s3`. Every trait call maps onto one or more plain S3 requests;
//! failures are returned as-is, without retry.

use crate::{BlobStore, ObjectInfo, StorageError, StorageResult};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Static access keys for an S3 endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

/// Connection settings for [`S3BlobStore::connect`].
#[derive(Debug, Clone, Default)]
pub struct S3Settings {
    /// Bucket holding the versioned objects.
    pub bucket: String,
    /// Region; falls back to the AWS environment when unset.
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible services. Enables path-style addressing.
    pub endpoint: Option<String>,
    /// Static credentials; the default AWS provider chain is used when unset.
    pub credentials: Option<S3Credentials>,
}

/// S3-backed blob store.
#[derive(Clone)]
pub struct S3BlobStore {
    s3_client: S3Client,
    bucket_name: String,
}

impl S3BlobStore {
    /// Create a store from an existing client.
    pub fn new(s3_client: S3Client, bucket_name: impl Into<String>) -> Self {
        Self {
            s3_client,
            bucket_name: bucket_name.into(),
        }
    }

    /// Build a client from settings and the ambient AWS configuration.
    pub async fn connect(settings: S3Settings) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &settings.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(credentials) = &settings.credentials {
            loader = loader.credentials_provider(Credentials::new(
                &credentials.access_key_id,
                &credentials.secret_access_key,
                credentials.session_token.clone(),
                None,
                "promptvault",
            ));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &settings.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        debug!(bucket = %settings.bucket, endpoint = ?settings.endpoint, "Connected S3 client");
        Self::new(S3Client::from_conf(builder.build()), settings.bucket)
    }

    /// Name of the bucket this store writes to.
    pub fn bucket(&self) -> &str {
        &self.bucket_name
    }
}

/// Best-effort MIME type from a key's extension.
fn content_type_for(key: &str) -> Option<&'static str> {
    let extension = key.rsplit_once('.')?.1.to_ascii_lowercase();
    match extension.as_str() {
        "yaml" | "yml" => Some("application/yaml"),
        "json" => Some("application/json"),
        "txt" | "md" => Some("text/plain"),
        _ => None,
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn list(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let output = self
                .s3_client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| {
                    StorageError::remote(format!(
                        "list_objects_v2 {prefix:?}: {}",
                        DisplayErrorContext(&e)
                    ))
                })?;

            for object in output.contents.unwrap_or_default() {
                let Some(key) = object.key else {
                    continue;
                };
                let updated = object
                    .last_modified
                    .and_then(|dt| chrono::DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()));
                objects.push(ObjectInfo {
                    key,
                    size: object.size.unwrap_or(0).max(0) as u64,
                    updated,
                    content_type: None,
                });
            }

            if output.is_truncated.unwrap_or(false) {
                continuation_token = output.next_continuation_token;
                if continuation_token.is_none() {
                    break;
                }
            } else {
                break;
            }
        }

        debug!(prefix, count = objects.len(), "Listed S3 objects");
        Ok(objects)
    }

    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let result = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| {
                        StorageError::remote(format!("Failed to read S3 object body: {e}"))
                    })?
                    .into_bytes();
                Ok(Some(bytes.to_vec()))
            }
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_no_such_key() {
                    return Ok(None);
                }
                Err(StorageError::remote(format!(
                    "get_object {key:?}: {}",
                    DisplayErrorContext(&service_error)
                )))
            }
        }
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> StorageResult<()> {
        debug!(key, bytes = data.len(), "Uploading S3 object");
        self.s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .set_content_type(content_type_for(key).map(str::to_string))
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                StorageError::remote(format!("put_object {key:?}: {}", DisplayErrorContext(&e)))
            })?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let result = self
            .s3_client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(StorageError::remote(format!(
                        "head_object {key:?}: {}",
                        DisplayErrorContext(&service_error)
                    )))
                }
            }
        }
    }

    async fn delete_tree(&self, prefix: &str) -> StorageResult<usize> {
        let objects = self.list(prefix).await?;
        for object in &objects {
            self.s3_client
                .delete_object()
                .bucket(&self.bucket_name)
                .key(&object.key)
                .send()
                .await
                .map_err(|e| {
                    StorageError::remote(format!(
                        "delete_object {:?}: {}",
                        object.key,
                        DisplayErrorContext(&e)
                    ))
                })?;
        }
        Ok(objects.len())
    }
}
