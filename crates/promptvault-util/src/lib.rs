//! Shared utilities for promptvault.
//!
//! - Logging setup with tracing
//! - Well-known paths and path helpers

pub mod log;
pub mod path;

pub use log::{LogConfig, LogLevel};
