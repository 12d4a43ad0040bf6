//! Server settings, loaded from an optional TOML file and overridden by flags

use serde::Deserialize;
use shared::{DEFAULT_BACKLOG, DEFAULT_MAX_MISSES, DEFAULT_PORT, MAX_LINE_LEN, MAX_NAME_LEN};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Tunables for the listener, the game rules and per-client limits
///
/// Every field has a default, so a config file only needs the keys it changes:
///
/// ```toml
/// port = 4000
/// max_misses = 6
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind to
    pub host: String,
    pub port: u16,
    /// Listen queue length for connections not yet accepted
    pub backlog: u32,
    /// Wrong guesses allowed per word before the round is lost
    pub max_misses: u32,
    /// Longest accepted input line in bytes, delimiter excluded
    pub max_line_len: usize,
    pub max_name_len: usize,
    /// Messages buffered per client before a slow reader is disconnected
    pub outbound_queue: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            backlog: DEFAULT_BACKLOG,
            max_misses: DEFAULT_MAX_MISSES,
            max_line_len: MAX_LINE_LEN,
            max_name_len: MAX_NAME_LEN,
            outbound_queue: 64,
        }
    }
}

impl ServerConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        let positive = [
            ("max_misses", self.max_misses as usize),
            ("max_line_len", self.max_line_len),
            ("max_name_len", self.max_name_len),
            ("outbound_queue", self.outbound_queue),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        if self.max_name_len > self.max_line_len {
            return Err(ConfigError::Invalid {
                field: "max_name_len",
                reason: format!("cannot exceed max_line_len ({})", self.max_line_len),
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|_| ConfigError::Invalid {
            field: "host",
            reason: format!("'{}' is not an IP address", self.host),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
