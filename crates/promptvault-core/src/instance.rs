//! A configured promptvault project.
//!
//! An instance ties a project directory to its merged configuration and the
//! [`SnapshotStore`] built from it. Explorers take the store from here by
//! constructor; there is no process-wide active instance.
//!
//! # Example
//!
//! ```no_run
//! use promptvault_core::Instance;
//! use promptvault_snapshot::Tier;
//!
//! # async fn example() -> promptvault_core::CoreResult<()> {
//! let instance = Instance::new("/path/to/project").await?;
//! let versions = instance.store().list_versions().await?;
//! let prompt = instance
//!     .store()
//!     .load_document(&["generic", "tvpi"], &Tier::Latest)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{Config, RemoteBackend};
use crate::error::{ConfigError, CoreResult};
use crate::explorer::{LocalExplorer, RemoteExplorer};
use promptvault_snapshot::{RemoteTier, SnapshotStore};
use promptvault_storage::{BlobStore, FsBlobStore, S3BlobStore, S3Credentials, S3Settings};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// A project directory with its configuration and store.
#[derive(Clone)]
pub struct Instance {
    inner: Arc<InstanceInner>,
}

struct InstanceInner {
    /// Project directory.
    directory: PathBuf,

    config: Config,

    /// Config files that contributed to `config`.
    config_sources: Vec<PathBuf>,

    store: Arc<SnapshotStore>,
}

impl Instance {
    /// Load configuration for `directory` and build its store.
    pub async fn new(directory: impl AsRef<Path>) -> CoreResult<Self> {
        let directory = directory.as_ref().to_path_buf();
        let (config, config_sources) = Config::load(Some(&directory)).await?;
        Self::with_config(directory, config, config_sources).await
    }

    /// Build an instance from an already loaded configuration.
    pub async fn with_config(
        directory: impl Into<PathBuf>,
        config: Config,
        config_sources: Vec<PathBuf>,
    ) -> CoreResult<Self> {
        let directory = directory.into();
        let store = build_store(&config, &directory).await?;

        info!(
            directory = %directory.display(),
            local_root = %store.local_root().display(),
            remote = store.has_remote(),
            "Opened project"
        );

        Ok(Self {
            inner: Arc::new(InstanceInner {
                directory,
                config,
                config_sources,
                store: Arc::new(store),
            }),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.inner.directory
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn config_sources(&self) -> &[PathBuf] {
        &self.inner.config_sources
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.inner.store
    }

    pub fn remote_explorer(&self) -> RemoteExplorer {
        RemoteExplorer::new(self.inner.store.clone())
    }

    pub fn local_explorer(&self) -> LocalExplorer {
        LocalExplorer::new(self.inner.store.local_root())
    }
}

/// Build a [`SnapshotStore`] from configuration.
///
/// The remote tier is attached only when a bucket is configured. A missing
/// prefix leaves it attached but unusable, so remote operations report a
/// configuration error.
pub async fn build_store(config: &Config, project_dir: &Path) -> CoreResult<SnapshotStore> {
    let mut store = SnapshotStore::new(config.local_root(project_dir), config.mapper().build())
        .with_ignore(config.ignore_filter()?);

    if let Some(blobs) = build_blob_store(config, project_dir).await? {
        let prefix = config.remote_prefix().unwrap_or_default();
        store = store.with_remote(RemoteTier::new(blobs, prefix));
    }

    Ok(store)
}

/// The configured remote blob store, if any.
pub async fn build_blob_store(
    config: &Config,
    project_dir: &Path,
) -> CoreResult<Option<Arc<dyn BlobStore>>> {
    let Some(bucket) = config.remote_bucket.clone() else {
        debug!("No remote bucket configured");
        return Ok(None);
    };

    let blobs: Arc<dyn BlobStore> = match config.remote_backend() {
        RemoteBackend::Fs => {
            let root = project_dir.join(&bucket);
            debug!(root = %root.display(), "Using directory blob store");
            Arc::new(FsBlobStore::new(root))
        }
        RemoteBackend::S3 => {
            let credentials = match &config.remote_credentials {
                Some(path) => Some(load_credentials(&project_dir.join(path)).await?),
                None => None,
            };
            let settings = S3Settings {
                bucket,
                region: config.remote_region.clone(),
                endpoint: config.remote_endpoint.clone(),
                credentials,
            };
            Arc::new(S3BlobStore::connect(settings).await)
        }
    };

    Ok(Some(blobs))
}

/// Read static access keys from a JSON file.
pub async fn load_credentials(path: &Path) -> CoreResult<S3Credentials> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ConfigError::FileRefNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content).map_err(|e| {
        ConfigError::InvalidJson {
            path: path.display().to_string(),
            message: e.to_string(),
        }
        .into()
    })
}
