//! Snapshot command handlers.
//!
//! Lists, saves and restores remote versions.

use promptvault_core::Instance;
use promptvault_snapshot::{Bump, Tier};
use std::path::PathBuf;

/// List remote versions, newest first.
pub async fn handle_versions(instance: &Instance, json: bool) -> anyhow::Result<()> {
    let versions = instance.store().list_versions().await?;

    if json {
        return super::print_json(&versions);
    }

    if versions.is_empty() {
        println!("No versions found.");
        return Ok(());
    }
    for (i, version) in versions.iter().enumerate() {
        if i == 0 {
            println!("{version}  (latest)");
        } else {
            println!("{version}");
        }
    }
    Ok(())
}

/// Upload the local tree as a new version.
pub async fn handle_save(instance: &Instance, bump: Bump) -> anyhow::Result<()> {
    let version = instance.store().save_snapshot(bump).await?;
    println!("Saved version {version}");
    Ok(())
}

/// Download a version into `target`, or over the local root with `replace`.
pub async fn handle_load(
    instance: &Instance,
    tier: Tier,
    target: Option<PathBuf>,
    replace: bool,
) -> anyhow::Result<()> {
    let dir = instance
        .store()
        .load_snapshot(&tier, target.as_deref(), replace)
        .await?;
    println!("Loaded {tier} into {}", dir.display());
    Ok(())
}
