//! The node configuration daemon.
//!
//! Nodes connect to one of the configured endpoints, send a single request
//! line naming a configuration part and their node id, and receive one reply
//! line carrying either the rendered configuration or a coded error:
//!
//! ```text
//! -> {"cfg_part":"lnp","node_id":7}
//! <- {"values":"bG5wLW5vZGUtNw=="}
//! ```
//!
//! Each part is served by a [`ConfigProvider`]. The providers live in a
//! [`ProviderRegistry`] that is built from the system settings at startup and
//! rebuilt on `SIGHUP`; a rebuilt registry only replaces the current one when
//! at least one provider configured, and the swap is atomic with respect to
//! request handling.
//!
//! Requests are served strictly one at a time on the thread that calls
//! [`Daemon::run`]. Control signals are handled on a separate thread and are
//! the only other accessor of the registry.

mod bootstrap;
mod dispatch;
mod health;
mod process;
mod providers;
mod registry;
mod server;
mod signals;
mod telemetry;
mod transport;

pub use bootstrap::{
    BootstrapError, ConfigLoader, Daemon, FileConfigLoader, StaticConfigLoader, bootstrap_with,
};
pub use dispatch::{
    CfgRequest, CfgResponse, DECODE_FAILURE_REASON, DispatchError, ErrorReply,
    INTERNAL_ERROR_REASON, RequestRouter, UNKNOWN_PART_REASON,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{LaunchError, run_daemon};
pub use providers::{
    BuiltinProviderFactory, ConfigProvider, NodeId, ProviderConfigError, ProviderError,
    ProviderFactory, ProviderKind, StaticTableProvider,
};
pub use registry::{PartDescription, ProviderRegistry, RegistryError, RegistryHandle};
pub use server::{ConfigureError, Server};
pub use signals::{ControlSignal, SignalError, SignalThread, apply_signal};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{ListenerError, MessageHandler, StopHandle, TransportError, TransportLoop};

#[cfg(test)]
mod tests;
