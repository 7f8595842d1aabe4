//! Provider registry and its wholesale replacement.
//!
//! A [`ProviderRegistry`] is built off to the side from the system settings
//! and only becomes visible to request handling once [`RegistryHandle::install`]
//! swaps it in. Readers hold the shared side of the lock for the duration of
//! a lookup plus provider call, so a provider is never dropped while it is
//! serving a request.

use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use nodecfg_config::SystemSettings;

use crate::health::HealthReporter;
use crate::providers::{ConfigProvider, ProviderFactory, ProviderKind};

/// Errors raised while building or accessing the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Every provider failed to configure.
    #[error("no configuration provider could be configured")]
    Empty,
    /// A thread panicked while holding the registry lock.
    #[error("provider registry lock poisoned")]
    Poisoned,
}

/// Mapping from part name to the provider serving it. Never empty.
pub struct ProviderRegistry {
    providers: BTreeMap<String, Box<dyn ConfigProvider>>,
}

impl ProviderRegistry {
    /// Builds a candidate registry holding every provider that configured.
    ///
    /// Providers that reject the settings are reported and left out.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Empty`] when no provider could be configured.
    pub fn build(
        factory: &dyn ProviderFactory,
        settings: &SystemSettings,
        reporter: &dyn HealthReporter,
    ) -> Result<Self, RegistryError> {
        let mut providers = BTreeMap::new();
        for kind in ProviderKind::ALL {
            let mut provider = factory.create(kind);
            match provider.configure(settings) {
                Ok(()) => {
                    reporter.provider_configured(kind);
                    providers.insert(kind.as_str().to_owned(), provider);
                }
                Err(error) => reporter.provider_skipped(kind, &error),
            }
        }
        Self::from_providers(providers)
    }

    /// Wraps already configured providers.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Empty`] when `providers` yields nothing.
    pub fn from_providers<I, S>(providers: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (S, Box<dyn ConfigProvider>)>,
        S: Into<String>,
    {
        let providers: BTreeMap<String, Box<dyn ConfigProvider>> = providers
            .into_iter()
            .map(|(part, provider)| (part.into(), provider))
            .collect();
        if providers.is_empty() {
            return Err(RegistryError::Empty);
        }
        Ok(Self { providers })
    }

    /// Looks up the provider registered for `part`.
    #[must_use]
    pub fn get(&self, part: &str) -> Option<&dyn ConfigProvider> {
        self.providers.get(part).map(|provider| &**provider)
    }

    /// Number of registered parts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Always `false` for a constructed registry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Registered part names in sorted order.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Asks every provider for its human-readable description.
    #[must_use]
    pub fn describe(&self) -> Vec<PartDescription> {
        self.providers
            .iter()
            .map(|(part, provider)| PartDescription {
                part: part.clone(),
                description: provider.show(),
            })
            .collect()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ProviderRegistry")
            .field("parts", &self.parts().collect::<Vec<_>>())
            .finish()
    }
}

/// One entry of a registry dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDescription {
    /// Registered part name.
    pub part: String,
    /// Text returned by the provider's `show`.
    pub description: String,
}

/// Shared handle to the current registry.
#[derive(Clone, Debug)]
pub struct RegistryHandle {
    inner: Arc<RwLock<ProviderRegistry>>,
}

impl RegistryHandle {
    /// Makes `registry` the current registry of a new handle.
    #[must_use]
    pub fn new(registry: ProviderRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Runs `f` against the current registry while holding the read lock.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if the lock is poisoned.
    pub fn with_registry<F, R>(&self, f: F) -> Result<R, RegistryError>
    where
        F: FnOnce(&ProviderRegistry) -> R,
    {
        let guard = self.inner.read().map_err(|_| RegistryError::Poisoned)?;
        Ok(f(&guard))
    }

    /// Replaces the current registry with `registry`.
    ///
    /// The previous registry is dropped after the write lock is released,
    /// once no reader can still reach it.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Poisoned`] if the lock is poisoned; the
    /// candidate is discarded in that case.
    pub fn install(&self, registry: ProviderRegistry) -> Result<(), RegistryError> {
        let previous = {
            let mut guard = self.inner.write().map_err(|_| RegistryError::Poisoned)?;
            mem::replace(&mut *guard, registry)
        };
        drop(previous);
        Ok(())
    }
}
