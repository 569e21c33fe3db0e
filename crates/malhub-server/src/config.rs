//! Configuration loading for the hub binary.
//!
//! The configuration lives in `malhub-config.yaml` in the working
//! directory, or wherever `MALHUB_CONFIG` points. Every field has a
//! default, so a missing file or an empty document is valid.
//!
//! ```yaml
//! server:
//!   host: "0.0.0.0"
//!   port: 8888
//! store:
//!   lock_timeout_ms: 5000
//!   performed_nodes_retention: ~
//! logging:
//!   level: "info"
//!   format: "pretty"
//! ```

use std::path::{Path, PathBuf};

use malhub_core::StoreConfig;
use malhub_observer::ServerConfig;
use serde::Deserialize;

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "malhub-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override held an unusable value.
    #[error("invalid value for {var} ({value}): {reason}")]
    Env {
        /// The environment variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level hub configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HubConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Entity store tuning.
    #[serde(default)]
    pub store: StoreConfig,

    /// Log level and output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HubConfig {
    /// Load configuration from the path in `MALHUB_CONFIG`, falling back
    /// to [`DEFAULT_CONFIG_PATH`]. A missing file yields defaults.
    ///
    /// Environment overrides are applied afterwards.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os("MALHUB_CONFIG")
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply `MALHUB_HOST` and `MALHUB_PORT` overrides, reading variables
    /// through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if `MALHUB_PORT` is not a port number.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("MALHUB_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("MALHUB_PORT") {
            self.server.port = port.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Env {
                    var: "MALHUB_PORT",
                    value: port.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    String::from("info")
}
