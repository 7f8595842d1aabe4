//! Error types for socket listener operations.

use std::io;
use std::net::SocketAddr;

use thiserror::Error;

use nodecfg_config::{SocketParseError, SocketPreparationError};

/// Errors surfaced while binding a single endpoint.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("invalid endpoint '{endpoint}': {source}")]
    Parse {
        endpoint: String,
        #[source]
        source: SocketParseError,
    },
    #[error("failed to prepare socket directory: {source}")]
    Prepare {
        #[source]
        source: SocketPreparationError,
    },
    #[error("failed to resolve TCP address {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("no TCP addresses resolved for {host}:{port}")]
    ResolveEmpty { host: String, port: u16 },
    #[error("failed to bind TCP listener at {addr}: {source}")]
    BindTcp {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        #[source]
        source: io::Error,
    },
    #[cfg(not(unix))]
    #[error("unix sockets are unsupported for endpoint {endpoint}")]
    UnsupportedUnix { endpoint: String },
    #[cfg(unix)]
    #[error("failed to bind unix listener at {path}: {source}")]
    BindUnix {
        path: String,
        #[source]
        source: io::Error,
    },
    #[cfg(unix)]
    #[error("existing unix socket {path} is already in use")]
    UnixInUse { path: String },
    #[cfg(unix)]
    #[error("unix socket path {path} is not a socket")]
    UnixNotSocket { path: String },
    #[cfg(unix)]
    #[error("failed to read metadata for unix socket {path}: {source}")]
    UnixMetadata {
        path: String,
        #[source]
        source: io::Error,
    },
    #[cfg(unix)]
    #[error("failed to connect to existing unix socket {path}: {source}")]
    UnixConnect {
        path: String,
        #[source]
        source: io::Error,
    },
    #[cfg(unix)]
    #[error("failed to remove stale unix socket {path}: {source}")]
    UnixCleanup {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Errors that stop the transport loop from starting.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The daemon configuration lists no endpoints.
    #[error("no listen endpoints configured")]
    NoEndpoints,
    /// Every configured endpoint failed to bind.
    #[error("none of the {attempted} configured endpoints could be bound")]
    NothingBound { attempted: usize },
}
