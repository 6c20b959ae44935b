//! Test fixtures for creating reproducible prompt trees.
//!
//! A fixture is a temporary project directory with a `prompts/` folder
//! inside it, optionally next to a `promptvault.json` configuration.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name of the prompts folder inside a fixture project.
pub const PROMPTS_DIR: &str = "prompts";

/// A temporary project with a configurable prompt tree.
///
/// The directory is removed when the built fixture is dropped.
///
/// # Example
///
/// ```rust
/// use promptvault_test_utils::fixtures::TestPromptTree;
///
/// let tree = TestPromptTree::new()
///     .with_prompt("generic/tvpi.yaml", "tvpi:\n  description: Total value\n")
///     .with_dir("customized")
///     .build();
///
/// assert!(tree.prompt_exists("generic/tvpi.yaml"));
/// ```
pub struct TestPromptTree {
    temp_dir: TempDir,
    /// Files to create (path relative to the project root -> contents).
    files: HashMap<PathBuf, Vec<u8>>,
    /// Directories to create (paths relative to the prompts folder).
    dirs: Vec<PathBuf>,
}

impl TestPromptTree {
    /// Create a new fixture builder.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            files: HashMap::new(),
            dirs: Vec::new(),
        }
    }

    /// Add a file relative to the prompts folder.
    pub fn with_prompt(self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        let path = Path::new(PROMPTS_DIR).join(path);
        self.with_file(path, contents)
    }

    /// Add a file relative to the project root.
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> Self {
        self.files
            .insert(path.as_ref().to_path_buf(), contents.into());
        self
    }

    /// Add an empty directory inside the prompts folder.
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.dirs.push(path.as_ref().to_path_buf());
        self
    }

    /// Add the three sample prompts from [`content`].
    pub fn with_sample_prompts(self) -> Self {
        content::SAMPLE_PROMPTS
            .iter()
            .fold(self, |tree, (path, body)| tree.with_prompt(path, *body))
    }

    /// Add a `promptvault.json` project configuration.
    pub fn with_config(self, config: &str) -> Self {
        self.with_file("promptvault.json", config)
    }

    /// Build the fixture, creating all files and directories.
    pub fn build(self) -> BuiltTestPromptTree {
        let root = self.temp_dir.path();
        let prompts = root.join(PROMPTS_DIR);

        fs::create_dir_all(&prompts).unwrap_or_else(|e| {
            panic!("Failed to create directory {}: {}", prompts.display(), e)
        });
        for dir in &self.dirs {
            let full_path = prompts.join(dir);
            fs::create_dir_all(&full_path).unwrap_or_else(|e| {
                panic!("Failed to create directory {}: {}", full_path.display(), e)
            });
        }

        for (path, contents) in &self.files {
            let full_path = root.join(path);
            if let Some(parent) = full_path.parent() {
                fs::create_dir_all(parent).unwrap_or_else(|e| {
                    panic!(
                        "Failed to create parent directory for {}: {}",
                        full_path.display(),
                        e
                    )
                });
            }
            fs::write(&full_path, contents)
                .unwrap_or_else(|e| panic!("Failed to write file {}: {}", full_path.display(), e));
        }

        BuiltTestPromptTree {
            temp_dir: self.temp_dir,
        }
    }
}

impl Default for TestPromptTree {
    fn default() -> Self {
        Self::new()
    }
}

/// A built fixture with files created on disk.
pub struct BuiltTestPromptTree {
    temp_dir: TempDir,
}

impl BuiltTestPromptTree {
    /// Project root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The prompts folder, i.e. the local tier root.
    pub fn prompts_dir(&self) -> PathBuf {
        self.path().join(PROMPTS_DIR)
    }

    /// Read a prompt file as text.
    pub fn read_prompt(&self, path: impl AsRef<Path>) -> String {
        let full_path = self.prompts_dir().join(path.as_ref());
        fs::read_to_string(&full_path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", full_path.display(), e))
    }

    /// Check if a prompt file exists.
    pub fn prompt_exists(&self, path: impl AsRef<Path>) -> bool {
        self.prompts_dir().join(path.as_ref()).exists()
    }

    /// Write a prompt file (for modifying during tests).
    pub fn write_prompt(&self, path: impl AsRef<Path>, contents: impl AsRef<[u8]>) {
        let full_path = self.prompts_dir().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).ok();
        }
        fs::write(&full_path, contents.as_ref())
            .unwrap_or_else(|e| panic!("Failed to write file {}: {}", full_path.display(), e));
    }

    /// Delete a prompt file.
    pub fn delete_prompt(&self, path: impl AsRef<Path>) {
        let full_path = self.prompts_dir().join(path.as_ref());
        fs::remove_file(&full_path)
            .unwrap_or_else(|e| panic!("Failed to delete file {}: {}", full_path.display(), e));
    }

    /// Every file under the prompts folder, keyed by forward-slash relative path.
    pub fn prompt_files(&self) -> BTreeMap<String, Vec<u8>> {
        read_tree(&self.prompts_dir())
    }
}

/// Every file under `dir`, keyed by forward-slash relative path.
///
/// Returns an empty map if `dir` does not exist.
pub fn read_tree(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut files = BTreeMap::new();
    if !dir.exists() {
        return files;
    }

    for entry in walkdir::WalkDir::new(dir) {
        let entry = entry.unwrap_or_else(|e| panic!("Failed to walk {}: {}", dir.display(), e));
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .expect("walked path is under its root")
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let data = fs::read(entry.path())
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", entry.path().display(), e));
        files.insert(relative, data);
    }
    files
}

/// Sample prompt documents.
pub mod content {
    /// Generic prompt for `metric_1`.
    pub const GENERIC_METRIC_1: &str = r#"metric_1:
  description: This is a generic prompt.
  extraction_instructions: 'Extract the following information from the text: [information]'
  synonyms:
  - Metric 1
  - metric 1
  - metric-1
"#;

    /// Brand 1 override of `metric_1`.
    pub const BRAND_1_METRIC_1: &str = r#"metric_1:
  description: This is a brand 1 specific prompt.
  extraction_instructions: 'Extract brand 1 specific information: [info]'
  synonyms:
  - Brand 1 Metric
  - b1-metric
"#;

    /// Brand 2 override of `metric_1`.
    pub const BRAND_2_METRIC_1: &str = r#"metric_1:
  description: This is a brand 2 specific prompt.
  extraction_instructions: 'Extract brand 2 specific information: [info]'
  synonyms:
  - Brand 2 Metric
  - b2-metric
"#;

    /// The sample prompts with their paths relative to the prompts folder.
    pub const SAMPLE_PROMPTS: [(&str, &str); 3] = [
        ("generic/metric_1.yaml", GENERIC_METRIC_1),
        ("customized/brand_1/metric_1.yaml", BRAND_1_METRIC_1),
        ("customized/brand_2/metric_1.yaml", BRAND_2_METRIC_1),
    ];

    /// A prompt with top-level fields, handy for field extraction.
    pub const FLAT_PROMPT: &str = r#"description: Total value to paid-in capital
extraction_instructions: Find the TVPI multiple
threshold: 2
"#;

    /// A `promptvault.json` pointing the remote tier at a directory.
    pub fn fs_remote_config(bucket_dir: &str, prefix: &str) -> String {
        format!(
            r#"{{
    "remote_backend": "fs",
    "remote_bucket": "{bucket_dir}",
    "remote_prefix": "{prefix}"
}}"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_tree() {
        let tree = TestPromptTree::new().build();
        assert!(tree.prompts_dir().is_dir());
        assert!(tree.prompt_files().is_empty());
    }

    #[test]
    fn test_tree_default() {
        let tree = TestPromptTree::default().build();
        assert!(tree.path().exists());
    }

    #[test]
    fn test_sample_prompts() {
        let tree = TestPromptTree::new().with_sample_prompts().build();

        let files = tree.prompt_files();
        assert_eq!(
            files.keys().map(String::as_str).collect::<Vec<_>>(),
            vec![
                "customized/brand_1/metric_1.yaml",
                "customized/brand_2/metric_1.yaml",
                "generic/metric_1.yaml",
            ]
        );
        assert!(tree
            .read_prompt("generic/metric_1.yaml")
            .contains("This is a generic prompt."));
    }

    #[test]
    fn test_with_dir_and_config() {
        let tree = TestPromptTree::new()
            .with_dir("empty/nested")
            .with_config(&content::fs_remote_config("/tmp/bucket", "artifacts"))
            .build();

        assert!(tree.prompts_dir().join("empty/nested").is_dir());
        let config = fs::read_to_string(tree.path().join("promptvault.json")).unwrap();
        assert!(config.contains("\"remote_prefix\": \"artifacts\""));
    }

    #[test]
    fn test_write_and_delete() {
        let tree = TestPromptTree::new().build();

        tree.write_prompt("deep/nested/file.yaml", "a: 1");
        assert!(tree.prompt_exists("deep/nested/file.yaml"));

        tree.delete_prompt("deep/nested/file.yaml");
        assert!(!tree.prompt_exists("deep/nested/file.yaml"));
    }

    #[test]
    fn test_read_tree_missing_dir() {
        let tree = TestPromptTree::new().build();
        assert!(read_tree(&tree.path().join("nope")).is_empty());
    }
}
