//! Logging initialization.

use promptvault_util::{log, LogConfig, LogLevel};

/// Initialize stderr logging.
///
/// `-v` forces debug; otherwise the configured level applies. `RUST_LOG`
/// overrides both.
pub fn init_logging(verbose: bool, configured: LogLevel) {
    let level = if verbose { LogLevel::Debug } else { configured };
    log::init(LogConfig {
        level,
        include_location: verbose,
        ..LogConfig::default()
    });
}
