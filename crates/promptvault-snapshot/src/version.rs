//! Version identifiers and the version index.
//!
//! Remote snapshots live under keys of the form
//! `<root_prefix>/Version <major>.<minor>.<patch>/<relative_path>`. The index
//! recovers the set of versions from a flat, unordered object listing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::trace;

/// Literal segment that introduces a version directory. Must stay byte-exact
/// for compatibility with existing buckets.
pub const VERSION_SEGMENT: &str = "Version ";

/// A `major.minor.patch` version.
///
/// Field order gives the derived `Ord` numeric tuple semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionId {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

/// A version string that is not `major.minor.patch`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version {0:?}: expected major.minor.patch")]
pub struct InvalidVersion(pub String);

impl VersionId {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// The version that follows `self` for the given bump, `None` if the
    /// bumped component would overflow.
    pub fn bump(&self, bump: Bump) -> Option<Self> {
        Some(match bump {
            Bump::Major => Self::new(self.major.checked_add(1)?, 0, 0),
            Bump::Minor => Self::new(self.major, self.minor.checked_add(1)?, 0),
            Bump::Patch => Self::new(self.major, self.minor, self.patch.checked_add(1)?),
        })
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for VersionId {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidVersion(s.to_string());

        let mut parts = s.split('.');
        let (Some(major), Some(minor), Some(patch), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let component = |part: &str| -> Result<u64, InvalidVersion> {
            // Canonical digits only: no sign, no leading zeros. This keeps
            // `to_string()` equal to the key segment it was parsed from.
            if part.is_empty()
                || !part.bytes().all(|b| b.is_ascii_digit())
                || (part.len() > 1 && part.starts_with('0'))
            {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };

        Ok(Self::new(
            component(major)?,
            component(minor)?,
            component(patch)?,
        ))
    }
}

impl Serialize for VersionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Which component to increment when creating a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bump {
    #[default]
    Major,
    Minor,
    Patch,
}

impl Bump {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bump::Major => "major",
            Bump::Minor => "minor",
            Bump::Patch => "patch",
        }
    }

    /// First version created when the remote tier has no versions yet.
    ///
    /// These are fixed seeds, not `0.0.0` bumped.
    pub fn seed(&self) -> VersionId {
        match self {
            Bump::Major => VersionId::new(1, 0, 0),
            Bump::Minor => VersionId::new(0, 1, 0),
            Bump::Patch => VersionId::new(0, 0, 1),
        }
    }
}

impl fmt::Display for Bump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bump {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "major" => Ok(Bump::Major),
            "minor" => Ok(Bump::Minor),
            "patch" => Ok(Bump::Patch),
            other => Err(format!(
                "invalid bump {other:?}: expected major, minor or patch"
            )),
        }
    }
}

/// Where a document is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tier {
    /// The local prompts directory.
    #[default]
    Local,
    /// The highest remote version, resolved by a fresh listing.
    Latest,
    /// A specific remote version.
    Version(VersionId),
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Local => f.write_str("local"),
            Tier::Latest => f.write_str("latest"),
            Tier::Version(v) => v.fmt(f),
        }
    }
}

impl FromStr for Tier {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Tier::Local),
            "latest" => Ok(Tier::Latest),
            other => other.parse().map(Tier::Version),
        }
    }
}

impl From<VersionId> for Tier {
    fn from(version: VersionId) -> Self {
        Tier::Version(version)
    }
}

/// `<root>/Version `: the prefix shared by every versioned object.
pub fn versions_prefix(root: &str) -> String {
    format!("{root}/{VERSION_SEGMENT}")
}

/// `<root>/Version <v>/`: the prefix of one snapshot.
pub fn version_prefix(root: &str, version: &VersionId) -> String {
    format!("{root}/{VERSION_SEGMENT}{version}/")
}

/// Full object key of a file inside a snapshot.
pub fn object_key(root: &str, version: &VersionId, relative_path: &str) -> String {
    format!("{}{relative_path}", version_prefix(root, version))
}

/// The set of versions present in a remote listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionIndex {
    versions: BTreeSet<VersionId>,
}

impl VersionIndex {
    /// Build an index from raw object names.
    ///
    /// Only names starting with `prefix` are considered; the segment between
    /// the prefix and the next `/` must parse as a version, anything else is
    /// skipped without error.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>, prefix: &str) -> Self {
        let mut versions = BTreeSet::new();
        for name in names {
            let Some(rest) = name.strip_prefix(prefix) else {
                continue;
            };
            let segment = rest.split('/').next().unwrap_or_default();
            match segment.parse::<VersionId>() {
                Ok(version) => {
                    versions.insert(version);
                }
                Err(e) => trace!(name, error = %e, "Skipping non-version key"),
            }
        }
        Self { versions }
    }

    /// Versions in descending order (newest first).
    pub fn descending(&self) -> Vec<VersionId> {
        self.versions.iter().rev().copied().collect()
    }

    /// The maximum version, if any.
    pub fn latest(&self) -> Option<VersionId> {
        self.versions.last().copied()
    }

    pub fn contains(&self, version: &VersionId) -> bool {
        self.versions.contains(version)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Version a new snapshot would get with the given bump.
    pub fn next_version(&self, bump: Bump) -> Option<VersionId> {
        next_version(&self.versions, bump)
    }
}

impl FromIterator<VersionId> for VersionIndex {
    fn from_iter<I: IntoIterator<Item = VersionId>>(iter: I) -> Self {
        Self {
            versions: iter.into_iter().collect(),
        }
    }
}

/// Distinct versions found among `names` under `prefix`, newest first.
pub fn list_versions<'a>(names: impl IntoIterator<Item = &'a str>, prefix: &str) -> Vec<VersionId> {
    VersionIndex::from_names(names, prefix).descending()
}

/// Next version after the maximum of `existing`, or the bump's seed if empty.
///
/// `None` when the maximum cannot be bumped without overflowing.
pub fn next_version(existing: &BTreeSet<VersionId>, bump: Bump) -> Option<VersionId> {
    match existing.last() {
        Some(latest) => latest.bump(bump),
        None => Some(bump.seed()),
    }
}
