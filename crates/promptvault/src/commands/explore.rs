//! Explorer command handlers.
//!
//! Remote commands inspect one or two stored versions; local commands walk
//! the prompts directory.

use chrono::{DateTime, Utc};
use promptvault_core::{FileNode, Instance};
use promptvault_snapshot::VersionId;

fn format_time(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// List the files of a version.
pub async fn handle_files(instance: &Instance, version: &VersionId, json: bool) -> anyhow::Result<()> {
    let files = instance
        .remote_explorer()
        .list_files_in_version(version)
        .await?;

    if json {
        return super::print_json(&files);
    }

    if files.is_empty() {
        println!("No files in version {version}.");
        return Ok(());
    }

    println!("{:<60} {:>10} {:<20}", "FILE", "SIZE", "UPDATED");
    println!("{}", "-".repeat(92));
    for file in &files {
        println!(
            "{:<60} {:>10} {:<20}",
            file.name,
            file.size,
            format_time(file.updated)
        );
    }
    Ok(())
}

/// Summarize a version.
pub async fn handle_info(instance: &Instance, version: &VersionId, json: bool) -> anyhow::Result<()> {
    let metadata = instance.remote_explorer().version_metadata(version).await?;

    if json {
        return super::print_json(&metadata);
    }

    println!("Version: {version}");
    println!("Files: {}", metadata.file_count);
    println!("Total size: {} bytes", metadata.total_size);
    println!("Last updated: {}", format_time(metadata.last_updated));
    if metadata.file_types.is_empty() {
        println!("File types: -");
    } else {
        println!("File types: {}", metadata.file_types.join(", "));
    }
    Ok(())
}

/// Show files added, removed or resized between two versions.
pub async fn handle_compare(
    instance: &Instance,
    from: &VersionId,
    to: &VersionId,
    json: bool,
) -> anyhow::Result<()> {
    let comparison = instance.remote_explorer().compare_versions(from, to).await?;

    if json {
        return super::print_json(&comparison);
    }

    if comparison.is_empty() {
        println!("No differences between {from} and {to}.");
        return Ok(());
    }

    println!("Comparing {from} -> {to}");
    for name in &comparison.added {
        println!("  + {name}");
    }
    for name in &comparison.removed {
        println!("  - {name}");
    }
    for name in &comparison.modified {
        println!("  ~ {name}");
    }
    Ok(())
}

/// Print the local YAML tree.
pub fn handle_tree(instance: &Instance, json: bool) -> anyhow::Result<()> {
    let explorer = instance.local_explorer();
    let tree = explorer.file_tree()?;

    if json {
        return super::print_json(&tree);
    }

    if tree.is_empty() {
        println!("No prompt files in {}.", explorer.root().display());
        return Ok(());
    }

    println!("{}", explorer.root().display());
    print_nodes(&tree.children, 1);
    Ok(())
}

fn print_nodes(nodes: &[FileNode], depth: usize) {
    let indent = "  ".repeat(depth);
    for node in nodes {
        match node {
            FileNode::Directory { name, children } => {
                println!("{indent}{name}/");
                print_nodes(children, depth + 1);
            }
            FileNode::File { name, size, .. } => {
                println!("{indent}{name} ({size} bytes)");
            }
        }
    }
}

/// Find local YAML files by path substring.
pub fn handle_search(instance: &Instance, query: &str, json: bool) -> anyhow::Result<()> {
    let matches = instance.local_explorer().search_files(query)?;
    let paths: Vec<&str> = matches.iter().map(|(relative, _)| relative.as_str()).collect();

    if json {
        return super::print_json(&paths);
    }

    if paths.is_empty() {
        println!("No files matching {query:?}.");
    }
    for path in paths {
        println!("{path}");
    }
    Ok(())
}

/// Print statistics for the local tree.
pub fn handle_stats(instance: &Instance, json: bool) -> anyhow::Result<()> {
    let stats = instance.local_explorer().file_stats()?;

    if json {
        return super::print_json(&stats);
    }

    println!("Files: {}", stats.total_files);
    println!("Total size: {} bytes", stats.total_size);
    println!("Directories: {}", stats.directory_count);
    if !stats.file_types.is_empty() {
        println!("File types:");
        for (ext, count) in &stats.file_types {
            println!("  {ext:<10} {count}");
        }
    }
    Ok(())
}
