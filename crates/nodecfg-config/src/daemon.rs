//! Daemon-level settings: listen endpoints and log verbosity.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::defaults::{default_log_format, default_log_level};
use crate::errors::ConfigError;
use crate::logging::{LogFormat, LogLevel};
use crate::read_toml;

/// Settings consumed by the daemon before any provider is built.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DaemonConfig {
    /// Endpoint URLs to bind, in order. Entries stay unparsed until bind time
    /// so a single bad address only costs that endpoint.
    #[serde(default)]
    pub listen: Vec<String>,
    /// Log verbosity, clamped into the supported range.
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
    /// Output format of the log stream.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

#[derive(Debug, Deserialize)]
struct DaemonFile {
    daemon: DaemonConfig,
}

impl DaemonConfig {
    /// Reads the `[daemon]` section of the given TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, is not TOML, or
    /// lacks a `[daemon]` section.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        read_toml::<DaemonFile>(path).map(|file| file.daemon)
    }

    /// Configured listen endpoints, in bind order.
    #[must_use]
    pub fn listen(&self) -> &[String] {
        &self.listen
    }

    /// Filter expression derived from the configured verbosity.
    #[must_use]
    pub const fn log_filter(&self) -> &'static str {
        self.log_level.as_filter()
    }

    /// Configured log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: Vec::new(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}
