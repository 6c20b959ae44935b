//! Key-to-path mapping strategies.
//!
//! A mapper turns the caller's key list (e.g. `["Goldman Sachs", "TVPI"]`)
//! into a forward-slash path relative to the local root or a version prefix.
//! Mappers are pure: no I/O, same keys always give the same path.

use crate::{SnapshotError, SnapshotResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Resolves document keys to a relative path.
pub trait PathMapper: Send + Sync {
    fn map(&self, keys: &[&str]) -> SnapshotResult<String>;
}

impl<F> PathMapper for F
where
    F: Fn(&[&str]) -> SnapshotResult<String> + Send + Sync,
{
    fn map(&self, keys: &[&str]) -> SnapshotResult<String> {
        self(keys)
    }
}

/// Lowercase, with spaces and dashes turned into underscores.
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace([' ', '-'], "_")
}

/// Joins keys verbatim with `/` and appends `.yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinMapper;

impl PathMapper for JoinMapper {
    fn map(&self, keys: &[&str]) -> SnapshotResult<String> {
        if keys.is_empty() {
            return Err(SnapshotError::invalid_argument("at least one key is required"));
        }
        for key in keys {
            if key.is_empty() || *key == "." || *key == ".." || key.contains('/') {
                return Err(SnapshotError::invalid_argument(format!(
                    "invalid key {key:?}"
                )));
            }
        }
        Ok(format!("{}.yaml", keys.join("/")))
    }
}

/// Slugified keys; the last one names the file, the others are directories.
///
/// `["finance", "metrics", "tvpi"]` -> `finance/metrics/tvpi.yaml`
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalMapper;

impl PathMapper for HierarchicalMapper {
    fn map(&self, keys: &[&str]) -> SnapshotResult<String> {
        if keys.is_empty() {
            return Err(SnapshotError::invalid_argument("at least one key is required"));
        }
        let slugs: Vec<String> = keys.iter().map(|k| slugify(k)).collect();
        Ok(format!("{}.yaml", slugs.join("/")))
    }
}

/// `[brand, metric]` keys with a shared `generic` brand.
///
/// `["Generic", "TVPI"]` -> `generic/tvpi.yaml`,
/// `["Goldman Sachs", "TVPI"]` -> `customized/goldman_sachs/tvpi.yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrandMetricMapper;

impl PathMapper for BrandMetricMapper {
    fn map(&self, keys: &[&str]) -> SnapshotResult<String> {
        let [brand, metric] = keys else {
            return Err(SnapshotError::invalid_argument(format!(
                "expected exactly 2 keys [brand, metric], got {}",
                keys.len()
            )));
        };

        let metric = slugify(metric);
        if brand.eq_ignore_ascii_case("generic") {
            Ok(format!("generic/{metric}.yaml"))
        } else {
            Ok(format!("customized/{}/{metric}.yaml", slugify(brand)))
        }
    }
}

/// Built-in mapper, selectable by name from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapperKind {
    #[default]
    Join,
    Hierarchical,
    BrandMetric,
}

impl MapperKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MapperKind::Join => "join",
            MapperKind::Hierarchical => "hierarchical",
            MapperKind::BrandMetric => "brand_metric",
        }
    }

    pub fn build(&self) -> Arc<dyn PathMapper> {
        match self {
            MapperKind::Join => Arc::new(JoinMapper),
            MapperKind::Hierarchical => Arc::new(HierarchicalMapper),
            MapperKind::BrandMetric => Arc::new(BrandMetricMapper),
        }
    }
}

impl fmt::Display for MapperKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapperKind {
    type Err = SnapshotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "join" => Ok(MapperKind::Join),
            "hierarchical" => Ok(MapperKind::Hierarchical),
            "brand_metric" => Ok(MapperKind::BrandMetric),
            other => Err(SnapshotError::invalid_argument(format!(
                "unknown mapper {other:?}: expected join, hierarchical or brand_metric"
            ))),
        }
    }
}
