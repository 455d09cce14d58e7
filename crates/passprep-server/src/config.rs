//! Server configuration
//!
//! Layered in order, later layers winning:
//! - built-in defaults
//! - an optional TOML file
//! - `PASSPREP_*` environment variables
//! - command-line flags (applied by the binary)

use passprep_run::STORE_FILE_NAME;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const ENV_ADDR: &str = "PASSPREP_ADDR";
pub const ENV_DATA_DIR: &str = "PASSPREP_DATA_DIR";
pub const ENV_LOG: &str = "PASSPREP_LOG";
pub const ENV_LOG_JSON: &str = "PASSPREP_LOG_JSON";

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid {key}='{value}': expected {expected}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Runtime configuration for the API server and CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Directory holding the run store file
    pub data_dir: PathBuf,
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            data_dir: PathBuf::from(".data"),
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ServerConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_log_json(mut self, json: bool) -> Self {
        self.log_json = json;
        self
    }

    /// Location of the run store document
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE_NAME)
    }

    /// Parse a TOML document; missing keys take their defaults
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Defaults, then `file` if given, then the process environment
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.apply_env()
    }

    /// Overlay `PASSPREP_*` variables from the process environment
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        let mut envs = HashMap::new();
        for key in [ENV_ADDR, ENV_DATA_DIR, ENV_LOG, ENV_LOG_JSON] {
            if let Ok(value) = std::env::var(key) {
                envs.insert(key.to_string(), value);
            }
        }
        self.apply_env_map(&envs)
    }

    /// Overlay variables from `envs`; blank values are ignored
    pub fn apply_env_map(mut self, envs: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            envs.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(value) = get(ENV_ADDR) {
            self.bind_addr = value.parse().map_err(|_| ConfigError::InvalidEnv {
                key: ENV_ADDR,
                value: value.clone(),
                expected: "a socket address like 127.0.0.1:8080",
            })?;
        }
        if let Some(value) = get(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(value);
        }
        if let Some(value) = get(ENV_LOG) {
            self.log_level = value;
        }
        if let Some(value) = get(ENV_LOG_JSON) {
            self.log_json = parse_flag(&value).ok_or(ConfigError::InvalidEnv {
                key: ENV_LOG_JSON,
                value: value.clone(),
                expected: "one of: true, false, 1, 0, yes, no, on, off",
            })?;
        }
        Ok(self)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
