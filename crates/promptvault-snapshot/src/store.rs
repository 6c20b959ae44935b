//! Two-tier document store.
//!
//! Documents live either in the local prompts directory or inside an
//! immutable remote snapshot:
//! ```text
//! <local_root>/
//!   generic/tvpi.yaml
//!   customized/goldman_sachs/tvpi.yaml
//!
//! <prefix>/Version 1.0.0/generic/tvpi.yaml
//! <prefix>/Version 1.0.0/customized/goldman_sachs/tvpi.yaml
//! <prefix>/Version 1.1.0/...
//! ```

use crate::ignore::IgnoreFilter;
use crate::mapper::PathMapper;
use crate::version::{
    object_key, version_prefix, versions_prefix, Bump, Tier, VersionId, VersionIndex,
};
use crate::{SnapshotError, SnapshotResult};
use promptvault_storage::{BlobStore, ObjectInfo};
use promptvault_util::path::to_slash_relative;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// A parsed YAML document. The store does not interpret its schema.
pub type Document = serde_yaml::Value;

/// Remote tier: a blob store plus the root prefix of the versioned namespace.
#[derive(Clone)]
pub struct RemoteTier {
    store: Arc<dyn BlobStore>,
    prefix: String,
}

impl RemoteTier {
    /// Create a remote tier. A trailing `/` on the prefix is dropped.
    pub fn new(store: Arc<dyn BlobStore>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into().trim_end_matches('/').to_string();
        Self { store, prefix }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }
}

impl std::fmt::Debug for RemoteTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTier")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// Versioned document store over a local directory and a remote blob store.
///
/// Every remote call is awaited in turn. Nothing is cached: `Tier::Latest`
/// re-lists the remote tier on each use.
pub struct SnapshotStore {
    local_root: PathBuf,
    mapper: Arc<dyn PathMapper>,
    remote: Option<RemoteTier>,
    ignore: IgnoreFilter,
}

impl SnapshotStore {
    /// Create a store with only the local tier configured.
    pub fn new(local_root: impl Into<PathBuf>, mapper: Arc<dyn PathMapper>) -> Self {
        Self {
            local_root: local_root.into(),
            mapper,
            remote: None,
            ignore: IgnoreFilter::none(),
        }
    }

    pub fn with_remote(mut self, remote: RemoteTier) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_ignore(mut self, ignore: IgnoreFilter) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn local_root(&self) -> &Path {
        &self.local_root
    }

    pub fn ignore(&self) -> &IgnoreFilter {
        &self.ignore
    }

    pub fn remote(&self) -> Option<&RemoteTier> {
        self.remote.as_ref()
    }

    /// Whether remote operations can run.
    pub fn has_remote(&self) -> bool {
        self.remote_tier().is_ok()
    }

    fn remote_tier(&self) -> SnapshotResult<&RemoteTier> {
        match &self.remote {
            Some(remote) if !remote.prefix.is_empty() => Ok(remote),
            Some(_) => Err(SnapshotError::Config(
                "remote prefix is empty".to_string(),
            )),
            None => Err(SnapshotError::Config(
                "a remote blob store and prefix are required for this operation".to_string(),
            )),
        }
    }

    /// Relative path of the document identified by `keys`.
    pub fn relative_path(&self, keys: &[&str]) -> SnapshotResult<String> {
        let relative = self.mapper.map(keys)?;
        check_relative_path(&relative)?;
        Ok(relative)
    }

    /// Path of the document in the local tier. The file may not exist.
    pub fn local_path(&self, keys: &[&str]) -> SnapshotResult<PathBuf> {
        Ok(self.local_root.join(self.relative_path(keys)?))
    }

    /// Load and parse a document from the given tier.
    pub async fn load_document(&self, keys: &[&str], tier: &Tier) -> SnapshotResult<Document> {
        let relative = self.relative_path(keys)?;
        match tier {
            Tier::Local => self.load_local(&relative).await,
            Tier::Latest => {
                let version = self.latest_version().await?;
                self.load_remote(&relative, &version).await
            }
            Tier::Version(version) => self.load_remote(&relative, version).await,
        }
    }

    /// Load a document as text.
    ///
    /// Without `field` the whole document is returned as YAML. With a field,
    /// string values come back verbatim and other values as YAML.
    pub async fn load_document_as_str(
        &self,
        keys: &[&str],
        tier: &Tier,
        field: Option<&str>,
    ) -> SnapshotResult<String> {
        let document = self.load_document(keys, tier).await?;

        let Some(field) = field else {
            return serde_yaml::to_string(&document)
                .map_err(|e| SnapshotError::parse(keys.join("/"), e));
        };

        match document.get(field) {
            None => Err(SnapshotError::FieldNotFound(field.to_string())),
            Some(Document::String(value)) => Ok(value.clone()),
            Some(value) => serde_yaml::to_string(value)
                .map(|s| s.trim_end().to_string())
                .map_err(|e| SnapshotError::parse(keys.join("/"), e)),
        }
    }

    /// Write a document to the local tier, creating parent directories.
    pub async fn save_local_document(
        &self,
        keys: &[&str],
        document: &Document,
    ) -> SnapshotResult<PathBuf> {
        let path = self.local_path(keys)?;
        let yaml = serde_yaml::to_string(document)
            .map_err(|e| SnapshotError::parse(path.display().to_string(), e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, yaml).await?;

        debug!(path = %path.display(), "Saved local document");
        Ok(path)
    }

    async fn load_local(&self, relative: &str) -> SnapshotResult<Document> {
        let path = self.local_root.join(relative);
        debug!(path = %path.display(), "Loading local document");

        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SnapshotError::not_found(format!(
                    "prompt file {}",
                    path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };
        parse_document(&path.display().to_string(), data)
    }

    async fn load_remote(&self, relative: &str, version: &VersionId) -> SnapshotResult<Document> {
        let remote = self.remote_tier()?;
        let key = object_key(&remote.prefix, version, relative);
        debug!(key, "Loading remote document");

        if !remote.store.exists(&key).await? {
            return Err(SnapshotError::not_found(format!(
                "prompt file {relative} in version {version}"
            )));
        }
        let Some(data) = remote.store.get(&key).await? else {
            return Err(SnapshotError::not_found(format!(
                "prompt file {relative} in version {version}"
            )));
        };
        parse_document(&key, data)
    }

    async fn version_index(&self) -> SnapshotResult<VersionIndex> {
        let remote = self.remote_tier()?;
        let prefix = versions_prefix(&remote.prefix);
        let objects = remote.store.list(&prefix).await?;
        Ok(VersionIndex::from_names(
            objects.iter().map(|o| o.key.as_str()),
            &prefix,
        ))
    }

    /// All remote versions, newest first.
    pub async fn list_versions(&self) -> SnapshotResult<Vec<VersionId>> {
        Ok(self.version_index().await?.descending())
    }

    /// The newest remote version.
    pub async fn latest_version(&self) -> SnapshotResult<VersionId> {
        self.version_index()
            .await?
            .latest()
            .ok_or_else(|| SnapshotError::invalid_state("no versions found in remote storage"))
    }

    /// Upload the whole local tree as a new version and return it.
    ///
    /// Two concurrent callers can compute the same next version; the later
    /// upload then overwrites objects of the earlier one.
    pub async fn save_snapshot(&self, bump: Bump) -> SnapshotResult<VersionId> {
        let remote = self.remote_tier()?;
        if !self.local_root.is_dir() {
            return Err(SnapshotError::not_found(format!(
                "local directory {}",
                self.local_root.display()
            )));
        }

        let index = self.version_index().await?;
        let version = index.next_version(bump).ok_or_else(|| {
            SnapshotError::invalid_state(format!(
                "cannot bump {bump} past version {}",
                index.latest().map(|v| v.to_string()).unwrap_or_default()
            ))
        })?;
        let files = self.collect_local_files()?;
        if files.is_empty() {
            return Err(SnapshotError::invalid_state(format!(
                "no files to snapshot in {}",
                self.local_root.display()
            )));
        }

        let mut bytes = 0u64;
        for (path, relative) in &files {
            let data = fs::read(path).await?;
            bytes += data.len() as u64;
            let key = object_key(&remote.prefix, &version, relative);
            debug!(key, size = data.len(), "Uploading");
            remote.store.put(&key, data).await?;
        }

        info!(
            version = %version,
            bump = %bump,
            files = files.len(),
            bytes,
            "Saved snapshot"
        );
        Ok(version)
    }

    /// Regular, non-ignored files under the local root with their relative paths.
    ///
    /// Symlinks are followed. A path that cannot become a key fails the whole
    /// collection rather than leaving the file out of the snapshot.
    fn collect_local_files(&self) -> SnapshotResult<Vec<(PathBuf, String)>> {
        let mut files = Vec::new();
        let walker = walkdir::WalkDir::new(&self.local_root)
            .follow_links(true)
            .sort_by_file_name();
        for entry in walker {
            let entry = entry.map_err(std::io::Error::from)?;
            if entry.file_type().is_dir() {
                continue;
            }
            if !entry.file_type().is_file() {
                warn!(path = %entry.path().display(), "Skipping non-regular file");
                continue;
            }

            let Some(relative) = to_slash_relative(entry.path(), &self.local_root) else {
                return Err(SnapshotError::invalid_argument(format!(
                    "path {} is not valid UTF-8",
                    entry.path().display()
                )));
            };
            if self.ignore.is_ignored(&relative) {
                debug!(path = %relative, "Ignored");
                continue;
            }
            files.push((entry.into_path(), relative));
        }
        Ok(files)
    }

    /// Download a remote version into a directory and return that directory.
    ///
    /// With `replace`, the local root is removed and recreated from the
    /// snapshot. Otherwise `target_dir` is required and must not exist.
    pub async fn load_snapshot(
        &self,
        tier: &Tier,
        target_dir: Option<&Path>,
        replace: bool,
    ) -> SnapshotResult<PathBuf> {
        let remote = self.remote_tier()?;
        if !replace && target_dir.is_none() {
            return Err(missing_target());
        }

        let version = match tier {
            Tier::Local => {
                return Err(SnapshotError::invalid_argument(
                    "cannot load a snapshot from the local tier",
                ));
            }
            Tier::Latest => self.latest_version().await?,
            Tier::Version(version) => *version,
        };

        let prefix = version_prefix(&remote.prefix, &version);
        let listed = remote.store.list(&prefix).await?;
        if listed.is_empty() {
            return Err(SnapshotError::not_found(format!("Version {version}")));
        }
        let objects = relative_objects(&prefix, listed)?;

        let destination = match target_dir {
            _ if replace => {
                let destination = self.local_root.clone();
                if destination.exists() {
                    debug!(path = %destination.display(), "Removing local directory");
                    fs::remove_dir_all(&destination).await?;
                }
                destination
            }
            Some(target) if target.exists() => {
                return Err(SnapshotError::AlreadyExists(target.to_path_buf()));
            }
            Some(target) => target.to_path_buf(),
            None => return Err(missing_target()),
        };
        fs::create_dir_all(&destination).await?;

        let mut downloaded = 0usize;
        for (relative, object) in &objects {
            if self.ignore.is_ignored(relative) {
                debug!(path = %relative, "Ignored");
                continue;
            }
            let Some(data) = remote.store.get(&object.key).await? else {
                return Err(SnapshotError::not_found(object.key.clone()));
            };

            let path = destination.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await?;
            }
            debug!(key = %object.key, path = %path.display(), "Downloading");
            fs::write(&path, data).await?;
            downloaded += 1;
        }

        info!(
            version = %version,
            files = downloaded,
            path = %destination.display(),
            "Loaded snapshot"
        );
        Ok(destination)
    }

    /// Objects of one version with paths relative to the version prefix,
    /// sorted by path. Directory markers are left out.
    pub async fn list_version_objects(
        &self,
        version: &VersionId,
    ) -> SnapshotResult<Vec<(String, ObjectInfo)>> {
        let remote = self.remote_tier()?;
        let prefix = version_prefix(&remote.prefix, version);
        let listed = remote.store.list(&prefix).await?;
        let mut objects = relative_objects(&prefix, listed)?;
        objects.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(objects)
    }

    /// Raw content of one file in a version, `None` if absent.
    pub async fn read_version_file(
        &self,
        version: &VersionId,
        relative: &str,
    ) -> SnapshotResult<Option<Vec<u8>>> {
        check_relative_path(relative)?;
        let remote = self.remote_tier()?;
        Ok(remote
            .store
            .get(&object_key(&remote.prefix, version, relative))
            .await?)
    }
}

fn missing_target() -> SnapshotError {
    SnapshotError::invalid_argument(
        "a target directory is required unless replacing the local directory",
    )
}

/// Reject paths that could escape the directory they are joined onto.
pub(crate) fn check_relative_path(relative: &str) -> SnapshotResult<()> {
    let invalid = relative.is_empty()
        || relative.starts_with('/')
        || relative.contains('\\')
        || relative
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if invalid {
        return Err(SnapshotError::invalid_argument(format!(
            "invalid relative path {relative:?}"
        )));
    }
    Ok(())
}

/// Strip `prefix` from listed keys, skipping directory markers.
fn relative_objects(
    prefix: &str,
    listed: Vec<ObjectInfo>,
) -> SnapshotResult<Vec<(String, ObjectInfo)>> {
    let mut objects = Vec::with_capacity(listed.len());
    for object in listed {
        if object.is_dir_marker() {
            warn!(key = %object.key, "Skipping directory marker");
            continue;
        }
        let Some(relative) = object.key.strip_prefix(prefix) else {
            continue;
        };
        check_relative_path(relative)?;
        objects.push((relative.to_string(), object));
    }
    Ok(objects)
}

fn parse_document(source: &str, data: Vec<u8>) -> SnapshotResult<Document> {
    let text = String::from_utf8(data).map_err(|e| SnapshotError::parse(source, e))?;
    serde_yaml::from_str(&text).map_err(|e| SnapshotError::parse(source, e))
}
