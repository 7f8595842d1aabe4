use crate::logging::{LogFormat, LogLevel};

/// Default location of the daemon-level configuration file.
pub const DEFAULT_DAEMON_CONFIG_PATH: &str = "/etc/nodecfg/daemon.toml";

/// Default location of the system-level configuration file.
pub const DEFAULT_SYSTEM_CONFIG_PATH: &str = "/etc/nodecfg/system.toml";

/// Environment variable overriding the daemon configuration path.
pub const DAEMON_CONFIG_ENV_VAR: &str = "NODECFG_DAEMON_CONFIG";

/// Environment variable overriding the system configuration path.
pub const SYSTEM_CONFIG_ENV_VAR: &str = "NODECFG_SYSTEM_CONFIG";

/// Default log verbosity used when the daemon section omits `log_level`.
#[must_use]
pub const fn default_log_level() -> LogLevel {
    LogLevel::Info
}

/// Default logging format for the daemon.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
