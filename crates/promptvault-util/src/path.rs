//! Path utilities.

use std::path::{Component, Path, PathBuf};

/// Project configuration file names, in lookup order.
pub const PROJECT_CONFIG_FILES: [&str; 2] = ["promptvault.jsonc", "promptvault.json"];

/// Get the promptvault configuration directory.
///
/// On Linux this follows XDG conventions:
/// - `$XDG_CONFIG_HOME/promptvault` if set
/// - `~/.config/promptvault` otherwise
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("promptvault"))
}

/// Normalize a path by removing `.` and `..` components.
///
/// Unlike `canonicalize`, this doesn't require the path to exist.
pub fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            _ => {
                result.push(component);
            }
        }
    }

    result
}

/// Join a path safely, preventing path traversal.
///
/// Returns `None` if the resulting path would be outside the base.
pub fn safe_join(base: &Path, path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return None;
    }
    let normalized = normalize(&base.join(path));
    if normalized.starts_with(normalize(base)) {
        Some(normalized)
    } else {
        None
    }
}

/// Forward-slash form of `path` relative to `base`.
///
/// Returns `None` if `path` is not under `base` or is not valid UTF-8.
pub fn to_slash_relative(path: &Path, base: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let segments: Option<Vec<&str>> = relative
        .components()
        .map(|component| component.as_os_str().to_str())
        .collect();
    Some(segments?.join("/"))
}

/// Find the project root by walking up the directory tree.
///
/// Looks for a promptvault configuration file or a `.git/` directory.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let has_marker = PROJECT_CONFIG_FILES
            .iter()
            .chain(std::iter::once(&".git"))
            .any(|marker| current.join(marker).exists());
        if has_marker {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_dir() {
        if let Some(dir) = config_dir() {
            assert!(dir.ends_with("promptvault"));
        }
    }

    #[test]
    fn test_normalize() {
        let path = Path::new("/home/user/./project/../project/src");
        assert_eq!(normalize(path), PathBuf::from("/home/user/project/src"));
    }

    #[test]
    fn test_safe_join() {
        let base = PathBuf::from("/srv/prompts");

        assert_eq!(
            safe_join(&base, Path::new("generic/tvpi.yaml")),
            Some(PathBuf::from("/srv/prompts/generic/tvpi.yaml"))
        );
        assert!(safe_join(&base, Path::new("../../../etc/passwd")).is_none());
        assert!(safe_join(&base, Path::new("/etc/passwd")).is_none());
        assert!(safe_join(&base, Path::new("a/../../prompts2/x")).is_none());
    }

    #[test]
    fn test_to_slash_relative() {
        let base = Path::new("/srv/prompts");
        assert_eq!(
            to_slash_relative(Path::new("/srv/prompts/customized/acme/tvpi.yaml"), base),
            Some("customized/acme/tvpi.yaml".to_string())
        );
        assert_eq!(to_slash_relative(Path::new("/elsewhere/a.yaml"), base), None);
    }

    #[test]
    fn test_find_project_root() {
        let dir = tempdir().unwrap();
        let project = dir.path().join("myproject");
        std::fs::create_dir_all(project.join("prompts/generic")).unwrap();
        std::fs::write(project.join("promptvault.json"), "{}").unwrap();

        let root = find_project_root(&project.join("prompts/generic"));
        assert_eq!(root, Some(project));
    }
}
