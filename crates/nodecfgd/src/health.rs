//! Structured health reporting for daemon lifecycle events.

use std::sync::Arc;

use nodecfg_config::DaemonConfig;

use crate::bootstrap::BootstrapError;
use crate::providers::{ProviderConfigError, ProviderKind};
use crate::server::ConfigureError;

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked once the daemon is configured and its endpoints are bound.
    fn bootstrap_succeeded(&self, config: &DaemonConfig, bound: usize);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked when a provider accepted the system settings.
    fn provider_configured(&self, kind: ProviderKind);

    /// Invoked when a provider is left out of the candidate registry.
    fn provider_skipped(&self, kind: ProviderKind, error: &ProviderConfigError);

    /// Invoked after a registry becomes current.
    fn registry_installed(&self, parts: &[String]);

    /// Invoked when a reconfiguration leaves the current registry in place.
    fn reconfigure_failed(&self, error: &ConfigureError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &DaemonConfig, bound: usize) {
        (**self).bootstrap_succeeded(config, bound);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn provider_configured(&self, kind: ProviderKind) {
        (**self).provider_configured(kind);
    }

    fn provider_skipped(&self, kind: ProviderKind, error: &ProviderConfigError) {
        (**self).provider_skipped(kind, error);
    }

    fn registry_installed(&self, parts: &[String]) {
        (**self).registry_installed(parts);
    }

    fn reconfigure_failed(&self, error: &ConfigureError) {
        (**self).reconfigure_failed(error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &DaemonConfig, bound: usize) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            configured = config.listen().len(),
            bound,
            log_filter = %config.log_filter(),
            log_format = %config.log_format(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn provider_configured(&self, kind: ProviderKind) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "provider_configured",
            provider = %kind,
            "provider configured"
        );
    }

    fn provider_skipped(&self, kind: ProviderKind, error: &ProviderConfigError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "provider_skipped",
            provider = %kind,
            message = %error.message(),
            error = ?error,
            "provider failed to configure"
        );
    }

    fn registry_installed(&self, parts: &[String]) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "registry_installed",
            parts = ?parts,
            "provider registry installed"
        );
    }

    fn reconfigure_failed(&self, error: &ConfigureError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "reconfigure_failed",
            error = %error,
            "reconfiguration rejected; keeping current registry"
        );
    }
}
