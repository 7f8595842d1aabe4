//! The configured server: the current registry and the means to rebuild it.
//!
//! A [`Server`] is built once by the entry point and shared by [`Arc`] with
//! the transport loop (through its [`RequestRouter`]) and the control-signal
//! thread. Reconfiguration rebuilds a candidate registry from freshly loaded
//! system settings and swaps it in only when at least one provider configured.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use nodecfg_config::ConfigError;

use crate::bootstrap::ConfigLoader;
use crate::dispatch::RequestRouter;
use crate::health::HealthReporter;
use crate::providers::ProviderFactory;
use crate::registry::{PartDescription, ProviderRegistry, RegistryError, RegistryHandle};

/// Errors that leave the current registry (if any) unchanged.
#[derive(Debug, Error)]
pub enum ConfigureError {
    /// The system settings could not be loaded.
    #[error("failed to load system settings: {source}")]
    Settings {
        /// Underlying loader error.
        #[source]
        source: ConfigError,
    },
    /// The candidate registry could not be built or installed.
    #[error("failed to install provider registry: {source}")]
    Registry {
        /// Underlying registry error.
        #[source]
        source: RegistryError,
    },
}

/// Owner of the current provider registry.
pub struct Server {
    loader: Arc<dyn ConfigLoader>,
    factory: Arc<dyn ProviderFactory>,
    reporter: Arc<dyn HealthReporter>,
    registry: RegistryHandle,
}

impl Server {
    /// Performs the first configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigureError`] when the settings cannot be loaded or no
    /// provider configures. The daemon cannot serve in that case.
    pub fn configure(
        loader: Arc<dyn ConfigLoader>,
        factory: Arc<dyn ProviderFactory>,
        reporter: Arc<dyn HealthReporter>,
    ) -> Result<Self, ConfigureError> {
        let candidate = build_candidate(&*loader, &*factory, &*reporter)?;
        let parts = part_names(&candidate);
        let server = Self {
            loader,
            factory,
            reporter,
            registry: RegistryHandle::new(candidate),
        };
        server.reporter.registry_installed(&parts);
        Ok(server)
    }

    /// Rebuilds the registry from freshly loaded settings and swaps it in.
    ///
    /// Returns the number of parts now served. On failure the previous
    /// registry stays current and the failure is reported.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigureError`] when the candidate cannot be built or
    /// installed.
    pub fn reconfigure(&self) -> Result<usize, ConfigureError> {
        let result = self.try_reconfigure();
        if let Err(error) = &result {
            self.reporter.reconfigure_failed(error);
        }
        result
    }

    fn try_reconfigure(&self) -> Result<usize, ConfigureError> {
        let candidate = build_candidate(&*self.loader, &*self.factory, &*self.reporter)?;
        let parts = part_names(&candidate);
        self.registry
            .install(candidate)
            .map_err(|source| ConfigureError::Registry { source })?;
        self.reporter.registry_installed(&parts);
        Ok(parts.len())
    }

    /// Describes every registered provider.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if the registry lock is poisoned.
    pub fn show_config(&self) -> Result<Vec<PartDescription>, RegistryError> {
        self.registry.with_registry(ProviderRegistry::describe)
    }

    /// Router serving requests against this server's registry.
    #[must_use]
    pub fn router(&self) -> RequestRouter {
        RequestRouter::new(self.registry.clone())
    }

    /// Shared handle to the current registry.
    #[must_use]
    pub fn registry(&self) -> &RegistryHandle {
        &self.registry
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Server")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn build_candidate(
    loader: &dyn ConfigLoader,
    factory: &dyn ProviderFactory,
    reporter: &dyn HealthReporter,
) -> Result<ProviderRegistry, ConfigureError> {
    let settings = loader
        .load_system()
        .map_err(|source| ConfigureError::Settings { source })?;
    ProviderRegistry::build(factory, &settings, reporter)
        .map_err(|source| ConfigureError::Registry { source })
}

fn part_names(registry: &ProviderRegistry) -> Vec<String> {
    registry.parts().map(str::to_owned).collect()
}
