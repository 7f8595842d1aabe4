//! Daemon bootstrap orchestration.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;

use nodecfg_config::{ConfigError, DaemonConfig, LaunchArgs, SystemSettings};

use crate::health::HealthReporter;
use crate::providers::ProviderFactory;
use crate::server::{ConfigureError, Server};
use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::transport::{StopHandle, TransportError, TransportLoop};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon-level settings.
    fn load_daemon(&self) -> Result<DaemonConfig, ConfigError>;

    /// Loads the system-level settings handed to providers. Called again on
    /// every reconfiguration.
    fn load_system(&self) -> Result<SystemSettings, ConfigError>;
}

/// Loader reading both files from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileConfigLoader {
    daemon_path: PathBuf,
    system_path: PathBuf,
}

impl FileConfigLoader {
    /// Builds a loader for the given files.
    pub fn new(daemon_path: impl Into<PathBuf>, system_path: impl Into<PathBuf>) -> Self {
        Self {
            daemon_path: daemon_path.into(),
            system_path: system_path.into(),
        }
    }

    /// Builds a loader for the files named on the command line.
    #[must_use]
    pub fn from_args(args: &LaunchArgs) -> Self {
        Self::new(&args.daemon_config, &args.system_config)
    }
}

impl ConfigLoader for FileConfigLoader {
    fn load_daemon(&self) -> Result<DaemonConfig, ConfigError> {
        DaemonConfig::load(&self.daemon_path)
    }

    fn load_system(&self) -> Result<SystemSettings, ConfigError> {
        SystemSettings::load(&self.system_path)
    }
}

/// Loader returning in-memory settings.
#[derive(Debug)]
pub struct StaticConfigLoader {
    daemon: DaemonConfig,
    system: RwLock<SystemSettings>,
}

impl StaticConfigLoader {
    /// Builds a loader returning the supplied settings.
    #[must_use]
    pub fn new(daemon: DaemonConfig, system: SystemSettings) -> Self {
        Self {
            daemon,
            system: RwLock::new(system),
        }
    }

    /// Replaces the system settings seen by the next load.
    pub fn replace_system(&self, system: SystemSettings) {
        *self.system.write().unwrap_or_else(PoisonError::into_inner) = system;
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load_daemon(&self) -> Result<DaemonConfig, ConfigError> {
        Ok(self.daemon.clone())
    }

    fn load_system(&self) -> Result<SystemSettings, ConfigError> {
        Ok(self
            .system
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The daemon configuration failed to load.
    #[error("failed to load daemon configuration: {source}")]
    DaemonConfig {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The first configuration failed.
    #[error("initial configuration failed: {source}")]
    Configure {
        /// Underlying configuration error.
        #[source]
        source: ConfigureError,
    },
    /// No endpoint could be bound.
    #[error("failed to bind transport: {source}")]
    Transport {
        /// Underlying transport error.
        #[source]
        source: TransportError,
    },
}

/// Result of a successful bootstrap invocation.
#[derive(Debug)]
pub struct Daemon {
    config: DaemonConfig,
    server: Arc<Server>,
    transport: TransportLoop,
    telemetry: TelemetryHandle,
}

impl Daemon {
    /// Accessor for the daemon configuration.
    #[must_use]
    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    /// Shared handle to the configured server.
    #[must_use]
    pub fn server(&self) -> Arc<Server> {
        Arc::clone(&self.server)
    }

    /// Accessor for the bound transport.
    #[must_use]
    pub fn transport(&self) -> &TransportLoop {
        &self.transport
    }

    /// Handle that stops [`Daemon::run`].
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.transport.stop_handle()
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Serves requests until stopped.
    pub fn run(&self) {
        let router = self.server.router();
        self.transport.run(&router);
    }
}

/// Bootstraps the daemon using the supplied collaborators.
///
/// Loads the daemon configuration, installs telemetry, performs the first
/// configuration, then binds the endpoints. Every failure is fatal.
///
/// # Errors
///
/// Returns [`BootstrapError`] naming the step that failed.
pub fn bootstrap_with(
    loader: Arc<dyn ConfigLoader>,
    reporter: Arc<dyn HealthReporter>,
    factory: Arc<dyn ProviderFactory>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();

    let config = reported(&*reporter, loader.load_daemon(), |source| {
        BootstrapError::DaemonConfig { source }
    })?;
    let telemetry = reported(&*reporter, telemetry::initialise(&config), |source| {
        BootstrapError::Telemetry { source }
    })?;
    let server = reported(
        &*reporter,
        Server::configure(loader, factory, Arc::clone(&reporter)),
        |source| BootstrapError::Configure { source },
    )?;
    let transport = reported(&*reporter, TransportLoop::bind(config.listen()), |source| {
        BootstrapError::Transport { source }
    })?;

    reporter.bootstrap_succeeded(&config, transport.endpoints().count());
    Ok(Daemon {
        config,
        server: Arc::new(server),
        transport,
        telemetry,
    })
}

fn reported<T, E>(
    reporter: &dyn HealthReporter,
    result: Result<T, E>,
    wrap: impl FnOnce(E) -> BootstrapError,
) -> Result<T, BootstrapError> {
    result.map_err(|source| {
        let error = wrap(source);
        reporter.bootstrap_failed(&error);
        error
    })
}
