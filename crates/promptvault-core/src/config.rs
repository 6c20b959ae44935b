//! Configuration management for promptvault.
//!
//! Configuration is loaded from multiple sources and merged:
//! 1. Global config: `~/.config/promptvault/config.json`
//! 2. Environment variable: `PROMPTVAULT_CONFIG_CONTENT`
//! 3. Project config: `promptvault.jsonc` or `promptvault.json` in the project directory
//! 4. Environment overrides: `PROMPTVAULT_LOCAL_ROOT`, `PROMPTVAULT_REMOTE_BUCKET`,
//!    `PROMPTVAULT_REMOTE_PREFIX`
//!
//! Supports JSONC (JSON with comments) and variable substitution:
//! - `{env:VAR_NAME}` - Substitute environment variable
//! - `{file:path}` - Substitute file contents

use crate::error::{ConfigError, CoreResult};
use promptvault_snapshot::{IgnoreFilter, MapperKind};
use promptvault_util::path::PROJECT_CONFIG_FILES;
use promptvault_util::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Environment variable holding a whole JSONC config.
pub const CONFIG_CONTENT_ENV: &str = "PROMPTVAULT_CONFIG_CONTENT";

/// Default local tier directory, relative to the project directory.
pub const DEFAULT_LOCAL_ROOT: &str = "prompts";

/// Static regex for variable substitution, compiled once.
static VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

/// Get the variable substitution regex, compiling it once on first use.
fn var_regex() -> &'static regex::Regex {
    VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\{(env|file):([^}]+)\}")
            .expect("Invalid regex pattern - this is a compile-time constant")
    })
}

/// Remote blob store implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteBackend {
    /// AWS S3 or an S3-compatible service.
    #[default]
    S3,
    /// A directory on the local filesystem (mounted bucket, tests).
    Fs,
}

impl RemoteBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteBackend::S3 => "s3",
            RemoteBackend::Fs => "fs",
        }
    }
}

impl std::fmt::Display for RemoteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON Schema reference.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Local tier directory. Relative paths are resolved against the project directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_root: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_backend: Option<RemoteBackend>,

    /// S3 bucket name, or root directory for the `fs` backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_bucket: Option<String>,

    /// JSON file with static access keys.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_credentials: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_region: Option<String>,

    /// Custom S3 endpoint (R2, MinIO, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_endpoint: Option<String>,

    /// Root key prefix of the versioned namespace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_prefix: Option<String>,

    /// Glob patterns excluded from snapshot transfers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_patterns: Option<Vec<String>>,

    /// Key-to-path strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapper: Option<MapperKind>,

    /// Default log level for the CLI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Loading order (later sources override earlier):
    /// 1. Global config from `~/.config/promptvault/`
    /// 2. `PROMPTVAULT_CONFIG_CONTENT` environment variable
    /// 3. Project config from `project_dir`
    /// 4. `PROMPTVAULT_*` environment overrides
    pub async fn load(project_dir: Option<&Path>) -> CoreResult<(Self, Vec<PathBuf>)> {
        let global_dir = promptvault_util::path::config_dir();
        Self::load_with(global_dir.as_deref(), project_dir, &|name| {
            std::env::var(name).ok()
        })
        .await
    }

    /// Load configuration with an explicit global directory and environment.
    pub async fn load_with(
        global_dir: Option<&Path>,
        project_dir: Option<&Path>,
        env: &(dyn Fn(&str) -> Option<String> + Sync),
    ) -> CoreResult<(Self, Vec<PathBuf>)> {
        let mut config = Config::default();
        let mut sources = Vec::new();

        // 1. Load global config
        if let Some(global_dir) = global_dir {
            for name in ["config.json", "promptvault.jsonc", "promptvault.json"] {
                let path = global_dir.join(name);
                if path.exists() {
                    let loaded = Self::load_file(&path, env).await?;
                    config = config.merge(loaded);
                    sources.push(path);
                    break;
                }
            }
        }

        // 2. Load from environment variable
        if let Some(content) = env(CONFIG_CONTENT_ENV) {
            let loaded = Self::parse_jsonc(&content, "<env>")?;
            config = config.merge(loaded);
        }

        // 3. Load project config
        if let Some(dir) = project_dir {
            for name in PROJECT_CONFIG_FILES {
                let path = dir.join(name);
                if path.exists() {
                    let loaded = Self::load_file(&path, env).await?;
                    config = config.merge(loaded);
                    sources.push(path);
                    break;
                }
            }
        }

        // 4. Environment overrides
        config.apply_env_overrides(env);

        config.validate()?;
        Ok((config, sources))
    }

    /// Load configuration from a file, resolving `{env:...}` through `env`.
    pub async fn load_file(
        path: &Path,
        env: &(dyn Fn(&str) -> Option<String> + Sync),
    ) -> CoreResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let content = Self::substitute_variables(&content, path, env)?;
        Self::parse_jsonc(&content, &path.display().to_string())
    }

    /// Apply the `PROMPTVAULT_*` single-value overrides.
    pub fn apply_env_overrides(&mut self, env: &(dyn Fn(&str) -> Option<String> + Sync)) {
        if let Some(root) = env("PROMPTVAULT_LOCAL_ROOT") {
            self.local_root = Some(PathBuf::from(root));
        }
        if let Some(bucket) = env("PROMPTVAULT_REMOTE_BUCKET") {
            self.remote_bucket = Some(bucket);
        }
        if let Some(prefix) = env("PROMPTVAULT_REMOTE_PREFIX") {
            self.remote_prefix = Some(prefix);
        }
    }

    /// Check values that serde cannot check on its own.
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(level) = &self.log_level {
            if LogLevel::parse(level).is_none() {
                return Err(ConfigError::validation(format!(
                    "log_level must be one of trace, debug, info, warn, error (got {level:?})"
                ))
                .into());
            }
        }
        if let Some(patterns) = &self.ignore_patterns {
            IgnoreFilter::new(patterns)
                .map_err(|e| ConfigError::validation(e.to_string()))?;
        }
        if matches!(&self.remote_bucket, Some(bucket) if bucket.trim().is_empty()) {
            return Err(ConfigError::validation("remote_bucket must not be empty").into());
        }
        Ok(())
    }

    /// Local tier directory resolved against `project_dir`.
    pub fn local_root(&self, project_dir: &Path) -> PathBuf {
        let root = self
            .local_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_ROOT));
        if root.is_absolute() {
            root
        } else {
            project_dir.join(root)
        }
    }

    /// Remote prefix without its trailing `/`, or `None` if unset or empty.
    pub fn remote_prefix(&self) -> Option<&str> {
        self.remote_prefix
            .as_deref()
            .map(|p| p.trim_end_matches('/'))
            .filter(|p| !p.is_empty())
    }

    pub fn remote_backend(&self) -> RemoteBackend {
        self.remote_backend.unwrap_or_default()
    }

    pub fn mapper(&self) -> MapperKind {
        self.mapper.unwrap_or_default()
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or_default()
    }

    /// Compiled ignore filter.
    pub fn ignore_filter(&self) -> CoreResult<IgnoreFilter> {
        let patterns = self.ignore_patterns.as_deref().unwrap_or_default();
        Ok(IgnoreFilter::new(patterns)?)
    }

    /// Parse JSONC (JSON with comments).
    fn parse_jsonc(content: &str, source: &str) -> CoreResult<Self> {
        // Strip comments (// and /* */)
        let stripped = Self::strip_comments(content);

        serde_json::from_str(&stripped).map_err(|e| {
            ConfigError::InvalidJson {
                path: source.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Strip JSON comments.
    fn strip_comments(input: &str) -> String {
        let mut result = String::with_capacity(input.len());
        let mut chars = input.chars().peekable();
        let mut in_string = false;
        let mut escape_next = false;

        while let Some(c) = chars.next() {
            if escape_next {
                result.push(c);
                escape_next = false;
                continue;
            }

            if c == '\\' && in_string {
                result.push(c);
                escape_next = true;
                continue;
            }

            if c == '"' {
                in_string = !in_string;
                result.push(c);
                continue;
            }

            if in_string {
                result.push(c);
                continue;
            }

            if c == '/' {
                match chars.peek() {
                    Some('/') => {
                        chars.next();
                        for c in chars.by_ref() {
                            if c == '\n' {
                                result.push('\n');
                                break;
                            }
                        }
                        continue;
                    }
                    Some('*') => {
                        chars.next();
                        let mut prev = ' ';
                        for c in chars.by_ref() {
                            if prev == '*' && c == '/' {
                                break;
                            }
                            // Keep line numbers stable for error messages
                            if c == '\n' {
                                result.push('\n');
                            }
                            prev = c;
                        }
                        continue;
                    }
                    _ => {}
                }
            }

            result.push(c);
        }

        result
    }

    /// Substitute `{env:NAME}` and `{file:path}` references.
    ///
    /// File references are resolved relative to the config file.
    fn substitute_variables(
        content: &str,
        config_path: &Path,
        env: &(dyn Fn(&str) -> Option<String> + Sync),
    ) -> CoreResult<String> {
        let config_dir = config_path.parent().unwrap_or(Path::new("."));
        let mut result = content.to_string();

        for cap in var_regex().captures_iter(content) {
            let (Some(full_match), Some(kind), Some(value)) = (cap.get(0), cap.get(1), cap.get(2))
            else {
                continue;
            };
            let value = value.as_str();

            let replacement = match kind.as_str() {
                "env" => env(value).ok_or_else(|| ConfigError::EnvVarNotFound {
                    name: value.to_string(),
                })?,
                "file" => {
                    let file_path = config_dir.join(value);
                    std::fs::read_to_string(&file_path)
                        .map_err(|_| ConfigError::FileRefNotFound {
                            path: file_path.display().to_string(),
                        })?
                        .trim()
                        .to_string()
                }
                _ => continue,
            };

            result = result.replace(full_match.as_str(), &replacement);
        }

        Ok(result)
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(self, other: Self) -> Self {
        Self {
            schema: other.schema.or(self.schema),
            local_root: other.local_root.or(self.local_root),
            remote_backend: other.remote_backend.or(self.remote_backend),
            remote_bucket: other.remote_bucket.or(self.remote_bucket),
            remote_credentials: other.remote_credentials.or(self.remote_credentials),
            remote_region: other.remote_region.or(self.remote_region),
            remote_endpoint: other.remote_endpoint.or(self.remote_endpoint),
            remote_prefix: other.remote_prefix.or(self.remote_prefix),
            ignore_patterns: other.ignore_patterns.or(self.ignore_patterns),
            mapper: other.mapper.or(self.mapper),
            log_level: other.log_level.or(self.log_level),
        }
    }
}
