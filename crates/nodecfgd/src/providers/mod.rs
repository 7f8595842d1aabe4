//! Configuration providers served by the daemon.
//!
//! A provider owns the configuration for one part and renders it for a
//! single node on request. The daemon only ever talks to providers through
//! [`ConfigProvider`]; the [`ProviderFactory`] seam decides which concrete
//! type backs each [`ProviderKind`].

mod static_table;

use std::fmt;

use thiserror::Error;

use nodecfg_config::SystemSettings;

pub use self::static_table::StaticTableProvider;

/// Identifier of the node a configuration is rendered for.
pub type NodeId = i32;

/// Provider kinds known to the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderKind {
    /// Signalling configuration.
    Signalling,
    /// Local number portability configuration.
    Lnp,
}

impl ProviderKind {
    /// Every kind, in the order providers are configured.
    pub const ALL: [Self; 2] = [Self::Signalling, Self::Lnp];

    /// Part name under which the provider is registered.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Signalling => "signalling",
            Self::Lnp => "lnp",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Capability implemented by every configuration provider.
///
/// `configure` runs before the provider is registered and may be called
/// with exclusive access only. `serialize` and `show` run under shared
/// access, possibly from several threads.
pub trait ConfigProvider: Send + Sync {
    /// Loads the provider's state from the system settings.
    fn configure(&mut self, settings: &SystemSettings) -> Result<(), ProviderConfigError>;

    /// Renders the configuration for `node_id`.
    fn serialize(&self, node_id: NodeId) -> Result<Vec<u8>, ProviderError>;

    /// Human-readable description used by registry dumps.
    fn show(&self) -> String;
}

/// Builds unconfigured providers for each known kind.
pub trait ProviderFactory: Send + Sync {
    /// Creates a fresh provider for `kind`.
    fn create(&self, kind: ProviderKind) -> Box<dyn ConfigProvider>;
}

/// Factory backing every kind with a [`StaticTableProvider`].
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinProviderFactory;

impl ProviderFactory for BuiltinProviderFactory {
    fn create(&self, kind: ProviderKind) -> Box<dyn ConfigProvider> {
        Box::new(StaticTableProvider::new(kind))
    }
}

/// Failure reported by a provider while rendering a configuration.
///
/// The code and message are relayed to the requesting node unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    /// Status code sent back to the node.
    pub code: i32,
    /// Reason sent back to the node.
    pub message: String,
}

impl ProviderError {
    /// Builds a provider error.
    #[must_use]
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Failure reported by a provider while loading its settings.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderConfigError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderConfigError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable message describing the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}
