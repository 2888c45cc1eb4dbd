//! Server configuration.
//!
//! # Responsibility
//! - Load the YAML config file and fill defaults.
//! - Apply `CATALOG_*` environment overrides.
//! - Resolve the database path against the config file directory.
//!
//! # Invariants
//! - A loaded config always has a non-blank `store.db_path`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const ENV_DB_PATH: &str = "CATALOG_DB_PATH";
pub const ENV_HTTP_PORT: &str = "CATALOG_HTTP_PORT";
pub const ENV_LOG_LEVEL: &str = "CATALOG_LOG_LEVEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Absolute directory for rolling log files; stderr when absent.
    #[serde(default)]
    pub log_dir: Option<String>,
    #[serde(default)]
    pub api: ApiConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Emit one `http_request` log event per request.
    #[serde(default)]
    pub logging: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            logging: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub db_path: PathBuf,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl StoreConfig {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

impl Config {
    /// Loads `path`, applies process environment overrides and validates.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, |key| std::env::var(key).ok())
    }

    /// Same as `load` with an injectable environment lookup.
    pub fn load_with_env(
        path: impl AsRef<Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::from_yaml(&raw)?;
        config.apply_env_overrides(env)?;
        config.validate()?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        config.store.db_path = resolve_relative(base_dir, &config.store.db_path);
        Ok(config)
    }

    /// Parses YAML without touching the environment or the file system.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Address the HTTP listener binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.http_port)
    }

    fn apply_env_overrides(
        &mut self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = non_blank(env(ENV_DB_PATH)) {
            self.store.db_path = PathBuf::from(value);
        }
        if let Some(value) = non_blank(env(ENV_HTTP_PORT)) {
            self.api.http_port = value.parse().map_err(|_| {
                ConfigError::Invalid(format!("{ENV_HTTP_PORT} must be a port number, got `{value}`"))
            })?;
        }
        if let Some(value) = non_blank(env(ENV_LOG_LEVEL)) {
            self.log_level = value;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.store.db_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("store.db_path is required".to_string()));
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn resolve_relative(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

fn default_log_level() -> String {
    catalog_core::default_log_level().to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_busy_timeout_ms() -> u64 {
    catalog_core::db::DEFAULT_BUSY_TIMEOUT.as_millis() as u64
}
