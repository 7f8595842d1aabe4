//! Doubles and fixtures shared by the daemon test suites.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use mockall::mock;

use nodecfg_config::{DaemonConfig, SystemSettings};

use crate::bootstrap::{BootstrapError, ConfigLoader, StaticConfigLoader};
use crate::dispatch::{CfgRequest, CfgResponse};
use crate::health::HealthReporter;
use crate::providers::{
    BuiltinProviderFactory, ConfigProvider, NodeId, ProviderConfigError, ProviderError,
    ProviderFactory, ProviderKind,
};
use crate::registry::ProviderRegistry;
use crate::server::{ConfigureError, Server};

mock! {
    pub Provider {}
    impl ConfigProvider for Provider {
        fn configure(&mut self, settings: &SystemSettings) -> Result<(), ProviderConfigError>;
        fn serialize(&self, node_id: NodeId) -> Result<Vec<u8>, ProviderError>;
        fn show(&self) -> String;
    }
}

/// Deterministic provider returning the same blob for every node.
pub struct FixedProvider {
    blob: Vec<u8>,
    _alive: Arc<()>,
}

impl FixedProvider {
    pub fn new(blob: &str) -> Self {
        Self::tracked(blob).0
    }

    /// Builds a provider plus a token whose strong count drops when the
    /// provider is dropped.
    pub fn tracked(blob: &str) -> (Self, Arc<()>) {
        let alive = Arc::new(());
        let provider = Self {
            blob: blob.as_bytes().to_vec(),
            _alive: Arc::clone(&alive),
        };
        (provider, alive)
    }
}

impl ConfigProvider for FixedProvider {
    fn configure(&mut self, _settings: &SystemSettings) -> Result<(), ProviderConfigError> {
        Ok(())
    }

    fn serialize(&self, _node_id: NodeId) -> Result<Vec<u8>, ProviderError> {
        Ok(self.blob.clone())
    }

    fn show(&self) -> String {
        format!("fixed blob of {} bytes", self.blob.len())
    }
}

/// Builds a registry of [`FixedProvider`]s from `(part, blob)` pairs.
pub fn fixed_registry(entries: &[(&str, &str)]) -> ProviderRegistry {
    ProviderRegistry::from_providers(entries.iter().map(|(part, blob)| {
        let provider: Box<dyn ConfigProvider> = Box::new(FixedProvider::new(blob));
        (*part, provider)
    }))
    .expect("test registry should not be empty")
}

/// Builds a registry holding a single provider.
pub fn registry_of(part: &str, provider: impl ConfigProvider + 'static) -> ProviderRegistry {
    let provider: Box<dyn ConfigProvider> = Box::new(provider);
    ProviderRegistry::from_providers([(part, provider)]).expect("test registry should not be empty")
}

pub fn settings_from(content: &str) -> SystemSettings {
    SystemSettings::parse(content).expect("test settings should parse")
}

/// Factory whose providers fail to configure for scripted kinds.
#[derive(Default)]
pub struct ScriptedFactory {
    failures: Mutex<BTreeMap<ProviderKind, String>>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(self, kind: ProviderKind, message: &str) -> Self {
        self.failures
            .lock()
            .expect("failures mutex poisoned")
            .insert(kind, message.to_owned());
        self
    }
}

impl ProviderFactory for ScriptedFactory {
    fn create(&self, kind: ProviderKind) -> Box<dyn ConfigProvider> {
        let failure = self
            .failures
            .lock()
            .expect("failures mutex poisoned")
            .get(&kind)
            .cloned();
        Box::new(ScriptedProvider { kind, failure })
    }
}

struct ScriptedProvider {
    kind: ProviderKind,
    failure: Option<String>,
}

impl ConfigProvider for ScriptedProvider {
    fn configure(&mut self, _settings: &SystemSettings) -> Result<(), ProviderConfigError> {
        match &self.failure {
            Some(message) => Err(ProviderConfigError::new(message.clone())),
            None => Ok(()),
        }
    }

    fn serialize(&self, node_id: NodeId) -> Result<Vec<u8>, ProviderError> {
        Ok(format!("{}:{node_id}", self.kind).into_bytes())
    }

    fn show(&self) -> String {
        self.kind.to_string()
    }
}

/// Records health events for assertions.
#[derive(Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &DaemonConfig, bound: usize) {
        self.record(HealthEvent::BootstrapSucceeded { bound });
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn provider_configured(&self, kind: ProviderKind) {
        self.record(HealthEvent::ProviderConfigured(kind));
    }

    fn provider_skipped(&self, kind: ProviderKind, _error: &ProviderConfigError) {
        self.record(HealthEvent::ProviderSkipped(kind));
    }

    fn registry_installed(&self, parts: &[String]) {
        self.record(HealthEvent::RegistryInstalled(parts.to_vec()));
    }

    fn reconfigure_failed(&self, error: &ConfigureError) {
        self.record(HealthEvent::ReconfigureFailed(error.to_string()));
    }
}

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded { bound: usize },
    BootstrapFailed(String),
    ProviderConfigured(ProviderKind),
    ProviderSkipped(ProviderKind),
    RegistryInstalled(Vec<String>),
    ReconfigureFailed(String),
}

/// A configured server backed by in-memory settings and built-in providers.
pub struct TestServer {
    pub server: Arc<Server>,
    pub loader: Arc<StaticConfigLoader>,
    pub reporter: Arc<RecordingHealthReporter>,
}

impl TestServer {
    pub fn with_settings(content: &str) -> Self {
        let loader = Arc::new(StaticConfigLoader::new(
            DaemonConfig::default(),
            settings_from(content),
        ));
        let reporter = Arc::new(RecordingHealthReporter::default());
        let shared_loader: Arc<dyn ConfigLoader> = loader.clone();
        let shared_reporter: Arc<dyn HealthReporter> = reporter.clone();
        let server = Server::configure(
            shared_loader,
            Arc::new(BuiltinProviderFactory),
            shared_reporter,
        )
        .expect("test server should configure");
        Self {
            server: Arc::new(server),
            loader,
            reporter,
        }
    }

    /// Part names of the current registry.
    pub fn parts(&self) -> Vec<String> {
        self.server
            .registry()
            .with_registry(|registry| registry.parts().map(str::to_owned).collect())
            .expect("registry lock should not be poisoned")
    }

    /// Sends one request through the server's router.
    pub fn request(&self, part: &str, node_id: NodeId) -> CfgResponse {
        let line = CfgRequest::new(part, node_id)
            .to_line()
            .expect("request should encode");
        self.server.router().reply_for(&line)
    }
}

/// Removes the quotes a feature file places around step arguments.
pub fn strip_quotes(value: &str) -> &str {
    value.trim_matches('"')
}
