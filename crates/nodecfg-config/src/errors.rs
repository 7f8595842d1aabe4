//! Errors raised while reading configuration files.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Read {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid TOML or does not match the expected schema.
    #[error("failed to parse configuration '{path}': {source}")]
    Parse {
        /// File that failed to parse.
        path: PathBuf,
        /// Underlying deserialisation error.
        #[source]
        source: Box<toml::de::Error>,
    },
}
