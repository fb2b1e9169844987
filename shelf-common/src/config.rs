//! Bootstrap configuration for Shelf services
//!
//! Configuration sources, highest priority first:
//! 1. Command-line arguments (`--database`, `--host`, `--port`, `--log-level`)
//! 2. TOML configuration file (located via `--config`, `SHELF_CONFIG`, or the
//!    platform config directory)
//! 3. Built-in defaults (code constants)
//!
//! A missing TOML file is not an error: a warning is logged and defaults apply.
//! A TOML file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SHELF_CONFIG";

/// Default OpenLibrary author search endpoint
pub const DEFAULT_OPENLIBRARY_URL: &str = "https://openlibrary.org/search/authors.json";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Path to SQLite database file (OS default when absent)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Interface to bind the HTTP server to
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub openlibrary: OpenLibraryConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            host: default_host(),
            port: default_port(),
            logging: LoggingConfig::default(),
            openlibrary: OpenLibraryConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Outbound author search API settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenLibraryConfig {
    /// Author search endpoint (queried with `q`, `limit`, `offset`)
    #[serde(default = "default_openlibrary_url")]
    pub base_url: String,

    /// Request timeout in milliseconds; expiry counts as an API failure
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl OpenLibraryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for OpenLibraryConfig {
    fn default() -> Self {
        Self {
            base_url: default_openlibrary_url(),
            timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

/// How incoming record versions are compared against stored versions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionPolicy {
    /// Write whenever the incoming version differs from the stored one
    #[default]
    Differs,
    /// Write only when the incoming version is strictly greater
    Newer,
}

/// What a search does when synchronizing fetched records fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncFailurePolicy {
    /// Log the failure and still return the fetched results
    #[default]
    Ignore,
    /// Turn the whole search into a database error response
    Fail,
}

/// Record synchronization settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub version_policy: VersionPolicy,

    #[serde(default)]
    pub failure_policy: SyncFailurePolicy,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5740
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_openlibrary_url() -> String {
    DEFAULT_OPENLIBRARY_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_user_agent() -> String {
    format!("Shelf/{} (author-search)", env!("CARGO_PKG_VERSION"))
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub openlibrary: OpenLibraryConfig,
    pub sync: SyncConfig,
}

impl Config {
    /// Merge TOML configuration with command-line overrides
    pub fn resolve(toml_config: TomlConfig, overrides: ConfigOverrides) -> Self {
        let database_path = overrides
            .database_path
            .or(toml_config.database_path)
            .unwrap_or_else(default_database_path);

        Self {
            database_path,
            host: overrides.host.unwrap_or(toml_config.host),
            port: overrides.port.unwrap_or(toml_config.port),
            log_level: overrides.log_level.unwrap_or(toml_config.logging.level),
            openlibrary: toml_config.openlibrary,
            sync: toml_config.sync,
        }
    }

    /// `host:port` string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Locate the config file: CLI argument, then `SHELF_CONFIG`, then the
/// platform config directory. Returns `None` when nothing is found.
pub fn resolve_config_path(cli_arg: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let user_config = dirs::config_dir()
        .map(|d| d.join("shelf").join(format!("{}.toml", module_name)))?;
    if user_config.exists() {
        Some(user_config)
    } else {
        None
    }
}

/// Where the bootstrap configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Read from this file
    File(PathBuf),
    /// This file was named but does not exist; defaults apply
    Missing(PathBuf),
    /// No file named or found; defaults apply
    Defaults,
}

impl ConfigSource {
    pub fn of(path: Option<&Path>) -> Self {
        match path {
            Some(path) if path.exists() => ConfigSource::File(path.to_path_buf()),
            Some(path) => ConfigSource::Missing(path.to_path_buf()),
            None => ConfigSource::Defaults,
        }
    }

    /// Report the source. Call once the subscriber is installed; config is
    /// read before logging is configured.
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Missing(path) => warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            ),
            ConfigSource::Defaults => info!("No config file found, using built-in defaults"),
        }
    }
}

/// Load TOML configuration, falling back to defaults when the file is absent.
///
/// Logs nothing; pair with [`ConfigSource::log`].
pub fn load_toml_config(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match ConfigSource::of(path) {
        ConfigSource::File(path) => path,
        ConfigSource::Missing(_) | ConfigSource::Defaults => return Ok(TomlConfig::default()),
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("shelf"))
        .unwrap_or_else(|| PathBuf::from("./shelf_data"))
        .join("shelf.db")
}
