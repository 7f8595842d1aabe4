//! Request/reply transport for the configured endpoints.
//!
//! Every endpoint is bound up front; endpoints that fail are skipped as long
//! as at least one binds. The loop then serves one connection at a time on a
//! single thread: read one request line, hand it to a [`MessageHandler`],
//! write the reply on the same connection, close.

mod errors;
mod event_loop;
mod handler;
mod listener;

pub use self::errors::{ListenerError, TransportError};
pub use self::event_loop::{StopHandle, TransportLoop};
pub(crate) use self::handler::ConnectionStream;
pub use self::handler::MessageHandler;

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
