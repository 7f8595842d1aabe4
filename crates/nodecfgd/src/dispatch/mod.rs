//! Request dispatch for configuration fetches.
//!
//! Each inbound line is decoded into a [`CfgRequest`], resolved against the
//! current provider registry, and answered with exactly one [`CfgResponse`].
//! Failures never escape the router; they become error replies instead.

mod errors;
mod request;
mod response;
mod router;

pub use self::errors::{
    DECODE_FAILURE_REASON, DispatchError, INTERNAL_ERROR_REASON, UNKNOWN_PART_REASON,
};
pub use self::request::CfgRequest;
pub use self::response::{CfgResponse, ErrorReply};
pub use self::router::RequestRouter;

const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
