//! Versioned prompt snapshots for promptvault.
//!
//! This crate provides the two-tier document model:
//! - Local documents addressed by keys through a [`PathMapper`]
//! - Immutable remote snapshots under `<prefix>/Version <major>.<minor>.<patch>/`
//! - Version discovery and bumping from an unordered remote listing
//! - Ignore patterns applied symmetrically on save and load
//!
//! # Example
//!
//! ```no_run
//! use promptvault_snapshot::{Bump, BrandMetricMapper, RemoteTier, SnapshotStore, Tier};
//! use promptvault_storage::FsBlobStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SnapshotStore::new("prompts", Arc::new(BrandMetricMapper))
//!     .with_remote(RemoteTier::new(Arc::new(FsBlobStore::new("/mnt/bucket")), "prompt-artifacts"));
//!
//! // Publish the local tree as a new minor version
//! let version = store.save_snapshot(Bump::Minor).await?;
//!
//! // Read a document back from that version
//! let prompt = store
//!     .load_document(&["Goldman Sachs", "TVPI"], &Tier::Version(version))
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod error;
pub mod ignore;
pub mod mapper;
mod store;
pub mod version;

pub use error::{SnapshotError, SnapshotResult};
pub use ignore::IgnoreFilter;
pub use mapper::{
    slugify, BrandMetricMapper, HierarchicalMapper, JoinMapper, MapperKind, PathMapper,
};
pub use store::{Document, RemoteTier, SnapshotStore};
pub use version::{Bump, InvalidVersion, Tier, VersionId, VersionIndex};
