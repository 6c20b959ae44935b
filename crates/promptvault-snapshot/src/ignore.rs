//! Ignore patterns for snapshot transfers.

use crate::{SnapshotError, SnapshotResult};
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Decides which relative paths take part in save and load.
///
/// Paths are forward-slash relative paths with no leading slash. The same
/// filter is applied to local walk paths and to remote keys stripped of their
/// version prefix, so a file skipped on save is also skipped on load.
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    patterns: Vec<Pattern>,
}

impl IgnoreFilter {
    /// Compile the given glob patterns.
    ///
    /// A run of `*` is a single `*`: `**` matches within one path segment
    /// like any other wildcard and is never recursive.
    pub fn new<I, S>(patterns: I) -> SnapshotResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Pattern::new(&collapse_stars(p)).map_err(|e| {
                    SnapshotError::invalid_argument(format!("invalid ignore pattern {p:?}: {e}"))
                })
            })
            .collect::<SnapshotResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// A filter that never excludes anything.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Source text of the compiled patterns, in order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Pattern::as_str)
    }

    /// True if any pattern matches `relative_path`.
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(relative_path, MATCH_OPTIONS))
    }
}

fn collapse_stars(pattern: &str) -> String {
    let mut collapsed = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '*' && collapsed.ends_with('*') {
            continue;
        }
        collapsed.push(c);
    }
    collapsed
}
