//! Command-line arguments accepted by the daemon binary.

use std::path::PathBuf;

use clap::Parser;

use crate::defaults::{
    DAEMON_CONFIG_ENV_VAR, DEFAULT_DAEMON_CONFIG_PATH, DEFAULT_SYSTEM_CONFIG_PATH,
    SYSTEM_CONFIG_ENV_VAR,
};

/// Launch arguments for `nodecfgd`.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "nodecfgd",
    version,
    about = "Serves per-node configuration parts over a request/reply socket"
)]
pub struct LaunchArgs {
    /// Daemon configuration file (listen endpoints, log level).
    #[arg(long, env = DAEMON_CONFIG_ENV_VAR, default_value = DEFAULT_DAEMON_CONFIG_PATH)]
    pub daemon_config: PathBuf,
    /// System configuration file handed to the providers.
    #[arg(long, env = SYSTEM_CONFIG_ENV_VAR, default_value = DEFAULT_SYSTEM_CONFIG_PATH)]
    pub system_config: PathBuf,
}
