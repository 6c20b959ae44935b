//! Promptvault - versioned prompt snapshots.
//!
//! This is the main entry point for the promptvault CLI.

mod commands;

use clap::{Parser, Subcommand};
use commands::*;
use promptvault_core::{Config, Instance};
use promptvault_snapshot::{Bump, Tier, VersionId};
use promptvault_util::path::find_project_root;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Parser)]
#[command(name = "promptvault")]
#[command(author, version, about = "Versioned prompt snapshots", long_about = None)]
struct Cli {
    /// Project directory (defaults to the nearest directory with a config file)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print output as JSON where supported
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Project(ProjectCommands),
    /// Print version information
    Version,
}

/// Commands that run against a configured project.
#[derive(Subcommand)]
enum ProjectCommands {
    /// List remote versions, newest first
    Versions,
    /// Upload the local prompts as a new version
    Save {
        /// Version component to increment (major, minor, patch)
        #[arg(short, long, default_value = "major")]
        bump: Bump,
    },
    /// Download a version
    Load {
        /// Version to download (latest or x.y.z)
        version: Tier,
        /// Directory to download into (must not exist)
        #[arg(short, long)]
        target: Option<PathBuf>,
        /// Replace the local prompts directory
        #[arg(long)]
        replace: bool,
    },
    /// Print a prompt document
    Get {
        /// Keys identifying the prompt
        #[arg(required = true, num_args = 1..)]
        keys: Vec<String>,
        /// Tier to read from (local, latest or x.y.z)
        #[arg(long, default_value = "local")]
        version: Tier,
        /// Print a single top-level field
        #[arg(short, long)]
        field: Option<String>,
    },
    /// Print a file by its path relative to the prompts directory
    Show {
        path: String,
        /// Tier to read from (local, latest or x.y.z)
        #[arg(long, default_value = "local")]
        version: Tier,
    },
    /// List the files of a version
    Files { version: VersionId },
    /// Summarize a version
    Info { version: VersionId },
    /// Compare two versions
    Compare { from: VersionId, to: VersionId },
    /// Show the local prompt tree
    Tree,
    /// Search local prompt files by path
    Search { query: String },
    /// Show local file statistics
    Stats,
    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Project(command) => run_project(command, cli.dir, cli.verbose, cli.json).await,
        Commands::Version => {
            init_logging(cli.verbose, Default::default());
            print_version();
            Ok(())
        }
    }
}

/// Load the project configuration and run one command against it.
async fn run_project(
    command: ProjectCommands,
    dir: Option<PathBuf>,
    verbose: bool,
    json: bool,
) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let directory = project_directory(dir.as_deref(), &cwd);
    let (config, sources) = Config::load(Some(&directory)).await?;
    init_logging(verbose, config.log_level());
    debug!(directory = %directory.display(), sources = sources.len(), "Loaded configuration");

    let instance = Instance::with_config(directory, config, sources).await?;

    match command {
        ProjectCommands::Versions => handle_versions(&instance, json).await,
        ProjectCommands::Save { bump } => handle_save(&instance, bump).await,
        ProjectCommands::Load {
            version,
            target,
            replace,
        } => handle_load(&instance, version, target, replace).await,
        ProjectCommands::Get {
            keys,
            version,
            field,
        } => handle_get(&instance, &keys, version, field.as_deref()).await,
        ProjectCommands::Show { path, version } => handle_show(&instance, &path, version).await,
        ProjectCommands::Files { version } => handle_files(&instance, &version, json).await,
        ProjectCommands::Info { version } => handle_info(&instance, &version, json).await,
        ProjectCommands::Compare { from, to } => {
            handle_compare(&instance, &from, &to, json).await
        }
        ProjectCommands::Tree => handle_tree(&instance, json),
        ProjectCommands::Search { query } => handle_search(&instance, &query, json),
        ProjectCommands::Stats => handle_stats(&instance, json),
        ProjectCommands::Config => handle_config(&instance),
    }
}

/// The explicit `--dir`, else the nearest configured ancestor, else `cwd`.
fn project_directory(dir: Option<&Path>, cwd: &Path) -> PathBuf {
    match dir {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => cwd.join(dir),
        None => find_project_root(cwd).unwrap_or_else(|| cwd.to_path_buf()),
    }
}

/// Print version information.
fn print_version() {
    println!("promptvault {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Versioned prompt snapshots on S3-compatible storage.");
}
