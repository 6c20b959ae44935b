//! Core coordination layer for promptvault.
//!
//! This crate ties the snapshot model to a project directory:
//! - Configuration management (multi-source, JSONC support)
//! - Building a [`SnapshotStore`](promptvault_snapshot::SnapshotStore) from configuration
//! - Explorers for inspecting remote versions and the local prompt tree

pub mod config;
pub mod error;
pub mod explorer;
pub mod instance;

pub use config::{Config, RemoteBackend};
pub use error::{ConfigError, CoreError, CoreResult};
pub use explorer::{
    FileNode, FileTree, LocalExplorer, LocalStats, RemoteExplorer, VersionComparison,
    VersionFile, VersionMetadata,
};
pub use instance::{build_blob_store, build_store, Instance};
