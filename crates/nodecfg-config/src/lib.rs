//! Configuration for the node configuration daemon.
//!
//! Two files feed the daemon. The daemon-level file names the endpoints to
//! listen on and the log verbosity; it is read once at startup. The
//! system-level file is an opaque TOML table handed to the configuration
//! providers, and is re-read on every reconfiguration.
//!
//! ```toml
//! # daemon.toml
//! [daemon]
//! listen = ["tcp://*:4444", "unix:///run/nodecfg/nodecfgd.sock"]
//! log_level = 2
//! log_format = "compact"
//! ```

mod cli;
mod daemon;
mod defaults;
mod errors;
mod logging;
mod socket;
mod system;

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

pub use cli::LaunchArgs;
pub use daemon::DaemonConfig;
pub use defaults::{
    DAEMON_CONFIG_ENV_VAR, DEFAULT_DAEMON_CONFIG_PATH, DEFAULT_SYSTEM_CONFIG_PATH,
    SYSTEM_CONFIG_ENV_VAR, default_log_format, default_log_level,
};
pub use errors::ConfigError;
pub use logging::{LogFormat, LogLevel};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};
pub use system::SystemSettings;

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}
