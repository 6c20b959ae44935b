//! Read-mostly views over the two tiers, for inspection tools.
//!
//! [`RemoteExplorer`] looks inside published versions through a
//! [`SnapshotStore`]. [`LocalExplorer`] walks the local prompts directory and
//! supports editing single files.

use crate::error::CoreResult;
use chrono::{DateTime, Utc};
use promptvault_snapshot::{SnapshotError, SnapshotStore, VersionId};
use promptvault_util::path::{safe_join, to_slash_relative};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};

/// One file of a remote version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionFile {
    /// Path relative to the version prefix.
    pub name: String,
    /// Full object key.
    pub key: String,
    pub size: u64,
    pub updated: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
}

/// Summary of a remote version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionMetadata {
    pub file_count: usize,
    pub total_size: u64,
    pub last_updated: Option<DateTime<Utc>>,
    /// Distinct lowercase extensions including the dot, sorted.
    pub file_types: Vec<String>,
}

/// Files added, removed or changed in size between two versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionComparison {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub modified: Vec<String>,
}

impl VersionComparison {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }
}

/// Inspects remote versions.
pub struct RemoteExplorer {
    store: Arc<SnapshotStore>,
}

impl RemoteExplorer {
    pub fn new(store: Arc<SnapshotStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Files of a version sorted by name. Directory markers are left out.
    pub async fn list_files_in_version(&self, version: &VersionId) -> CoreResult<Vec<VersionFile>> {
        let objects = self.store.list_version_objects(version).await?;
        Ok(objects
            .into_iter()
            .map(|(name, object)| VersionFile {
                name,
                key: object.key,
                size: object.size,
                updated: object.updated,
                content_type: object.content_type,
            })
            .collect())
    }

    /// Text content of one file, `None` if the version has no such file.
    pub async fn file_content(&self, version: &VersionId, name: &str) -> CoreResult<Option<String>> {
        let Some(data) = self.store.read_version_file(version, name).await? else {
            return Ok(None);
        };
        let text = String::from_utf8(data).map_err(|e| SnapshotError::parse(name, e))?;
        Ok(Some(text))
    }

    pub async fn version_metadata(&self, version: &VersionId) -> CoreResult<VersionMetadata> {
        let files = self.list_files_in_version(version).await?;

        let file_types: BTreeSet<String> = files
            .iter()
            .filter_map(|f| extension(&f.name))
            .collect();

        Ok(VersionMetadata {
            file_count: files.len(),
            total_size: files.iter().map(|f| f.size).sum(),
            last_updated: files.iter().filter_map(|f| f.updated).max(),
            file_types: file_types.into_iter().collect(),
        })
    }

    /// Compare two versions by file name and size. Content is not diffed.
    pub async fn compare_versions(
        &self,
        from: &VersionId,
        to: &VersionId,
    ) -> CoreResult<VersionComparison> {
        let before = self.sizes(from).await?;
        let after = self.sizes(to).await?;

        let mut comparison = VersionComparison::default();
        for (name, size) in &after {
            match before.get(name) {
                None => comparison.added.push(name.clone()),
                Some(old) if old != size => comparison.modified.push(name.clone()),
                Some(_) => {}
            }
        }
        comparison.removed = before
            .keys()
            .filter(|name| !after.contains_key(*name))
            .cloned()
            .collect();

        debug!(
            from = %from,
            to = %to,
            added = comparison.added.len(),
            removed = comparison.removed.len(),
            modified = comparison.modified.len(),
            "Compared versions"
        );
        Ok(comparison)
    }

    async fn sizes(&self, version: &VersionId) -> CoreResult<BTreeMap<String, u64>> {
        Ok(self
            .list_files_in_version(version)
            .await?
            .into_iter()
            .map(|f| (f.name, f.size))
            .collect())
    }
}

/// A node of the local prompt tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FileNode {
    Directory {
        name: String,
        children: Vec<FileNode>,
    },
    File {
        name: String,
        path: PathBuf,
        size: u64,
        modified: Option<DateTime<Utc>>,
    },
}

impl FileNode {
    pub fn name(&self) -> &str {
        match self {
            FileNode::Directory { name, .. } | FileNode::File { name, .. } => name,
        }
    }
}

/// YAML files and the non-empty, non-hidden directories holding them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileTree {
    pub children: Vec<FileNode>,
}

impl FileTree {
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of files anywhere in the tree.
    pub fn file_count(&self) -> usize {
        fn count(nodes: &[FileNode]) -> usize {
            nodes
                .iter()
                .map(|node| match node {
                    FileNode::Directory { children, .. } => count(children),
                    FileNode::File { .. } => 1,
                })
                .sum()
        }
        count(&self.children)
    }
}

/// Statistics over every file in the local tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalStats {
    pub total_files: usize,
    pub total_size: u64,
    /// Lowercase extension (with dot) to file count.
    pub file_types: BTreeMap<String, usize>,
    /// Distinct directories that directly contain a file.
    pub directory_count: usize,
}

/// Walks and edits the local prompts directory.
#[derive(Debug, Clone)]
pub struct LocalExplorer {
    root: PathBuf,
}

impl LocalExplorer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tree of YAML files. A missing root gives an empty tree.
    pub fn file_tree(&self) -> CoreResult<FileTree> {
        if !self.root.is_dir() {
            return Ok(FileTree::default());
        }
        Ok(FileTree {
            children: build_tree(&self.root)?,
        })
    }

    /// YAML files whose relative path contains `query`, ignoring case.
    ///
    /// Returns `(relative_path, full_path)` pairs sorted by relative path.
    pub fn search_files(&self, query: &str) -> CoreResult<Vec<(String, PathBuf)>> {
        let query = query.to_lowercase();
        let mut matches = Vec::new();

        for (relative, path) in self.walk_files()? {
            if is_yaml(&path) && relative.to_lowercase().contains(&query) {
                matches.push((relative, path));
            }
        }

        matches.sort();
        Ok(matches)
    }

    pub fn file_stats(&self) -> CoreResult<LocalStats> {
        let mut stats = LocalStats::default();
        let mut directories = BTreeSet::new();

        for (relative, path) in self.walk_files()? {
            let metadata = std::fs::metadata(&path)?;
            stats.total_files += 1;
            stats.total_size += metadata.len();
            if let Some(ext) = extension(&relative) {
                *stats.file_types.entry(ext).or_default() += 1;
            }
            let parent = relative.rsplit_once('/').map_or("", |(dir, _)| dir);
            directories.insert(parent.to_string());
        }

        stats.directory_count = directories.len();
        Ok(stats)
    }

    /// Read a file given its path relative to the root.
    pub async fn read_file(&self, relative: &str) -> CoreResult<String> {
        let path = self.resolve(relative)?;
        Ok(fs::read_to_string(&path).await?)
    }

    /// Overwrite (or create) a file given its path relative to the root.
    pub async fn write_file(&self, relative: &str, content: &str) -> CoreResult<PathBuf> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, content).await?;
        debug!(path = %path.display(), bytes = content.len(), "Wrote local file");
        Ok(path)
    }

    fn resolve(&self, relative: &str) -> CoreResult<PathBuf> {
        if relative.is_empty() {
            return Err(SnapshotError::invalid_argument("empty path").into());
        }
        safe_join(&self.root, Path::new(relative)).ok_or_else(|| {
            SnapshotError::invalid_argument(format!("path {relative:?} escapes {}", self.root.display()))
                .into()
        })
    }

    /// Every regular file under the root with its forward-slash relative path.
    fn walk_files(&self) -> CoreResult<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        if !self.root.is_dir() {
            return Ok(files);
        }

        for entry in walkdir::WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            match to_slash_relative(entry.path(), &self.root) {
                Some(relative) => files.push((relative, entry.into_path())),
                None => warn!(path = %entry.path().display(), "Skipping file with non UTF-8 path"),
            }
        }
        Ok(files)
    }
}

fn build_tree(dir: &Path) -> CoreResult<Vec<FileNode>> {
    let mut entries = std::fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut children = Vec::new();
    for entry in entries {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry.file_type()?;

        if file_type.is_file() && is_yaml(&path) {
            let metadata = entry.metadata()?;
            children.push(FileNode::File {
                name,
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                path,
            });
        } else if file_type.is_dir() && !name.starts_with('.') {
            let grandchildren = build_tree(&path)?;
            if !grandchildren.is_empty() {
                children.push(FileNode::Directory {
                    name,
                    children: grandchildren,
                });
            }
        }
    }
    Ok(children)
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Lowercase extension with its dot, taken from the last path segment.
fn extension(name: &str) -> Option<String> {
    let file_name = name.rsplit('/').next().unwrap_or(name);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => {
            Some(format!(".{}", ext.to_lowercase()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptvault_snapshot::{JoinMapper, RemoteTier};
    use promptvault_storage::{BlobStore, MemoryBlobStore};
    use promptvault_test_utils::TestPromptTree;

    const PREFIX: &str = "p";

    fn v(s: &str) -> VersionId {
        s.parse().unwrap()
    }

    fn remote_explorer(objects: Vec<(String, Vec<u8>)>) -> RemoteExplorer {
        let blobs: Arc<dyn BlobStore> = Arc::new(MemoryBlobStore::with_objects(objects));
        let store = SnapshotStore::new("unused", Arc::new(JoinMapper))
            .with_remote(RemoteTier::new(blobs, PREFIX));
        RemoteExplorer::new(Arc::new(store))
    }

    fn object(version: &str, name: &str, body: &str) -> (String, Vec<u8>) {
        (
            format!("{PREFIX}/Version {version}/{name}"),
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("a/b/tvpi.YAML"), Some(".yaml".to_string()));
        assert_eq!(extension("notes.tar.gz"), Some(".gz".to_string()));
        assert_eq!(extension("Makefile"), None);
        assert_eq!(extension("dir.d/.hidden"), None);
    }

    #[tokio::test]
    async fn test_list_files_and_content() {
        let explorer = remote_explorer(vec![
            object("1.0.0", "b.yaml", "b: 1\n"),
            object("1.0.0", "a/c.yml", "c: 1\n"),
            object("1.0.0", "a/", ""),
            object("2.0.0", "z.yaml", "z: 1\n"),
        ]);

        let files = explorer.list_files_in_version(&v("1.0.0")).await.unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a/c.yml", "b.yaml"]);
        assert_eq!(files[1].key, "p/Version 1.0.0/b.yaml");
        assert_eq!(files[1].size, 5);

        assert_eq!(
            explorer.file_content(&v("1.0.0"), "b.yaml").await.unwrap(),
            Some("b: 1\n".to_string())
        );
        assert_eq!(
            explorer.file_content(&v("1.0.0"), "z.yaml").await.unwrap(),
            None
        );
        assert!(explorer
            .list_files_in_version(&v("3.0.0"))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_version_metadata() {
        let explorer = remote_explorer(vec![
            object("1.0.0", "a.yaml", "12345"),
            object("1.0.0", "b.YML", "123"),
            object("1.0.0", "notes/readme.md", "1"),
            object("1.0.0", "LICENSE", "12"),
        ]);

        let metadata = explorer.version_metadata(&v("1.0.0")).await.unwrap();
        assert_eq!(metadata.file_count, 4);
        assert_eq!(metadata.total_size, 11);
        assert!(metadata.last_updated.is_some());
        assert_eq!(metadata.file_types, vec![".md", ".yaml", ".yml"]);

        let empty = explorer.version_metadata(&v("9.0.0")).await.unwrap();
        assert_eq!(empty, VersionMetadata::default());
    }

    #[tokio::test]
    async fn test_compare_versions() {
        let explorer = remote_explorer(vec![
            object("1.0.0", "kept.yaml", "same"),
            object("1.0.0", "gone.yaml", "x"),
            object("1.0.0", "grown.yaml", "ab"),
            object("1.0.0", "edited.yaml", "abc"),
            object("1.1.0", "kept.yaml", "same"),
            object("1.1.0", "grown.yaml", "abcd"),
            object("1.1.0", "edited.yaml", "xyz"),
            object("1.1.0", "new/one.yaml", "n"),
        ]);

        let comparison = explorer
            .compare_versions(&v("1.0.0"), &v("1.1.0"))
            .await
            .unwrap();
        assert_eq!(comparison.added, vec!["new/one.yaml"]);
        assert_eq!(comparison.removed, vec!["gone.yaml"]);
        // Same-size edits are not detected
        assert_eq!(comparison.modified, vec!["grown.yaml"]);

        let same = explorer
            .compare_versions(&v("1.0.0"), &v("1.0.0"))
            .await
            .unwrap();
        assert!(same.is_empty());
    }

    #[tokio::test]
    async fn test_remote_explorer_without_remote() {
        let store = SnapshotStore::new("unused", Arc::new(JoinMapper));
        let explorer = RemoteExplorer::new(Arc::new(store));
        assert!(explorer.list_files_in_version(&v("1.0.0")).await.is_err());
    }

    #[test]
    fn test_file_tree() {
        let tree = TestPromptTree::new()
            .with_sample_prompts()
            .with_prompt("readme.md", "not yaml")
            .with_prompt(".git/config.yaml", "hidden: true")
            .with_prompt("zeta/alpha.yml", "a: 1")
            .with_dir("empty/nested")
            .build();
        let explorer = LocalExplorer::new(tree.prompts_dir());

        let file_tree = explorer.file_tree().unwrap();
        let top: Vec<&str> = file_tree.children.iter().map(FileNode::name).collect();
        assert_eq!(top, vec!["customized", "generic", "zeta"]);
        assert_eq!(file_tree.file_count(), 4);

        let FileNode::Directory { children, .. } = &file_tree.children[0] else {
            panic!("expected a directory");
        };
        let brands: Vec<&str> = children.iter().map(FileNode::name).collect();
        assert_eq!(brands, vec!["brand_1", "brand_2"]);
    }

    #[test]
    fn test_file_tree_missing_root() {
        let tree = TestPromptTree::new().build();
        let explorer = LocalExplorer::new(tree.path().join("missing"));
        assert!(explorer.file_tree().unwrap().is_empty());
        assert_eq!(explorer.file_stats().unwrap(), LocalStats::default());
        assert!(explorer.search_files("x").unwrap().is_empty());
    }

    #[test]
    fn test_search_files() {
        let tree = TestPromptTree::new()
            .with_sample_prompts()
            .with_prompt("Brand_1-notes.txt", "no")
            .build();
        let explorer = LocalExplorer::new(tree.prompts_dir());

        let matches = explorer.search_files("BRAND_1").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].0, "customized/brand_1/metric_1.yaml");
        assert_eq!(
            matches[0].1,
            tree.prompts_dir().join("customized/brand_1/metric_1.yaml")
        );

        let all = explorer.search_files("metric").unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_file_stats() {
        let tree = TestPromptTree::new()
            .with_sample_prompts()
            .with_prompt("top.yaml", "t: 1")
            .with_prompt("docs/readme.MD", "hello")
            .build();
        let explorer = LocalExplorer::new(tree.prompts_dir());

        let stats = explorer.file_stats().unwrap();
        assert_eq!(stats.total_files, 5);
        assert_eq!(stats.file_types.get(".yaml"), Some(&4));
        assert_eq!(stats.file_types.get(".md"), Some(&1));
        // root, generic, brand_1, brand_2, docs
        assert_eq!(stats.directory_count, 5);
        let expected: u64 = tree.prompt_files().values().map(|v| v.len() as u64).sum();
        assert_eq!(stats.total_size, expected);
    }

    #[tokio::test]
    async fn test_read_and_write_file() {
        let tree = TestPromptTree::new().with_sample_prompts().build();
        let explorer = LocalExplorer::new(tree.prompts_dir());

        let content = explorer.read_file("generic/metric_1.yaml").await.unwrap();
        assert!(content.contains("generic prompt"));

        explorer
            .write_file("customized/brand_3/metric_1.yaml", "metric_1: {}\n")
            .await
            .unwrap();
        assert_eq!(
            tree.read_prompt("customized/brand_3/metric_1.yaml"),
            "metric_1: {}\n"
        );

        assert!(explorer.read_file("../promptvault.json").await.is_err());
        assert!(explorer.write_file("/etc/passwd", "x").await.is_err());
        assert!(explorer.read_file("").await.is_err());
    }
}
