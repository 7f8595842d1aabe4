//! Routes decoded requests to the provider registered for their part.

use tracing::{debug, error, info};

use crate::providers::NodeId;
use crate::registry::{ProviderRegistry, RegistryHandle};
use crate::transport::MessageHandler;

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use super::request::CfgRequest;
use super::response::{CfgResponse, encode_reply};

/// Turns raw request lines into raw reply lines.
///
/// The router never fails: every input produces exactly one reply.
#[derive(Clone, Debug)]
pub struct RequestRouter {
    registry: RegistryHandle,
}

impl RequestRouter {
    /// Builds a router reading from `registry`.
    #[must_use]
    pub fn new(registry: RegistryHandle) -> Self {
        Self { registry }
    }

    /// Handles one raw request and returns the encoded reply.
    #[must_use]
    pub fn handle(&self, raw: &[u8]) -> Vec<u8> {
        encode_reply(&self.reply_for(raw))
    }

    /// Handles one raw request and returns the typed reply.
    #[must_use]
    pub fn reply_for(&self, raw: &[u8]) -> CfgResponse {
        match self.dispatch(raw) {
            Ok(blob) => CfgResponse::values(blob),
            Err(dispatch_error) => {
                error!(
                    target: DISPATCH_TARGET,
                    code = dispatch_error.code(),
                    reason = %dispatch_error.reason(),
                    error = %dispatch_error,
                    "sending error reply"
                );
                CfgResponse::from(&dispatch_error)
            }
        }
    }

    fn dispatch(&self, raw: &[u8]) -> Result<Vec<u8>, DispatchError> {
        let request = CfgRequest::parse(raw)?;
        let part = request.resolved_part();
        info!(
            target: DISPATCH_TARGET,
            part,
            node_id = request.node_id,
            "processing request"
        );
        if part != request.cfg_part {
            debug!(
                target: DISPATCH_TARGET,
                requested = %request.cfg_part,
                part,
                "resolved legacy part alias"
            );
        }
        self.registry
            .with_registry(|registry| serialize_from(registry, part, request.node_id))?
    }
}

impl MessageHandler for RequestRouter {
    fn handle_message(&self, request: &[u8]) -> Vec<u8> {
        self.handle(request)
    }
}

fn serialize_from(
    registry: &ProviderRegistry,
    part: &str,
    node_id: NodeId,
) -> Result<Vec<u8>, DispatchError> {
    let provider = registry
        .get(part)
        .ok_or_else(|| DispatchError::unknown_part(part))?;
    provider
        .serialize(node_id)
        .map_err(|source| DispatchError::provider(part, source))
}
