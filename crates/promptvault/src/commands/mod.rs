//! Command handlers for the promptvault CLI.

pub mod config;
pub mod explore;
pub mod logging;
pub mod prompt;
pub mod snapshot;

pub use config::*;
pub use explore::*;
pub use logging::*;
pub use prompt::*;
pub use snapshot::*;

use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
