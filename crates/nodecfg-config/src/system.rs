//! System-level settings handed to configuration providers.

use std::path::{Path, PathBuf};

use crate::errors::ConfigError;
use crate::read_toml;

/// Opaque system settings table.
///
/// The daemon never interprets these values; each provider reads the section
/// named after its part.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemSettings {
    source: Option<PathBuf>,
    table: toml::Table,
}

impl SystemSettings {
    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let table = read_toml::<toml::Table>(path)?;
        Ok(Self {
            source: Some(path.to_path_buf()),
            table,
        })
    }

    /// Wraps an already parsed table.
    #[must_use]
    pub fn from_table(table: toml::Table) -> Self {
        Self {
            source: None,
            table,
        }
    }

    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns the TOML error when `content` is not a valid document.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        content.parse::<toml::Table>().map(Self::from_table)
    }

    /// Returns the table stored under `name`, if present.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&toml::Table> {
        self.table.get(name).and_then(toml::Value::as_table)
    }

    /// File the settings were read from, when loaded from disk.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}
