//! Reply envelope returned to nodes.
//!
//! A reply is a single JSON line holding exactly one of two keys:
//!
//! ```json
//! {"values":"bG5wLW5vZGUtNw=="}
//! {"error":{"code":404,"reason":"unknown cfg part"}}
//! ```
//!
//! The `values` blob is opaque to the daemon and travels base64-encoded.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::error;

use super::DISPATCH_TARGET;
use super::errors::{DispatchError, INTERNAL_ERROR_REASON};

const INTERNAL_ERROR_CODE: i32 = 500;

/// Reply to a configuration fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CfgResponse {
    /// Serialized configuration for the node.
    Values(#[serde(with = "blob")] Vec<u8>),
    /// Structured failure.
    Error(ErrorReply),
}

/// Error payload carried by [`CfgResponse::Error`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReply {
    /// Status code.
    pub code: i32,
    /// Human-readable reason.
    pub reason: String,
}

impl CfgResponse {
    /// Builds a successful reply.
    #[must_use]
    pub fn values(blob: Vec<u8>) -> Self {
        Self::Values(blob)
    }

    /// Builds an error reply.
    pub fn error(code: i32, reason: impl Into<String>) -> Self {
        Self::Error(ErrorReply {
            code,
            reason: reason.into(),
        })
    }

    /// Encodes the reply as a single JSON line.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error.
    pub fn to_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }

    /// Decodes a reply line.
    ///
    /// # Errors
    ///
    /// Returns the deserialisation error when `line` is not a reply.
    pub fn parse(line: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(line.trim_ascii())
    }
}

impl From<&DispatchError> for CfgResponse {
    fn from(error: &DispatchError) -> Self {
        Self::error(error.code(), error.reason())
    }
}

/// Encodes `reply`, degrading to an internal error reply and finally to an
/// empty reply when encoding fails.
pub(crate) fn encode_reply(reply: &CfgResponse) -> Vec<u8> {
    encode_with(reply, CfgResponse::to_line)
}

fn encode_with<E, F>(reply: &CfgResponse, encode: F) -> Vec<u8>
where
    E: fmt::Display,
    F: Fn(&CfgResponse) -> Result<Vec<u8>, E>,
{
    match encode(reply) {
        Ok(line) => line,
        Err(primary) => {
            error!(
                target: DISPATCH_TARGET,
                error = %primary,
                "failed to encode reply"
            );
            encode(&CfgResponse::error(INTERNAL_ERROR_CODE, INTERNAL_ERROR_REASON))
                .unwrap_or_else(|fallback| {
                    error!(
                        target: DISPATCH_TARGET,
                        error = %fallback,
                        "failed to encode internal error reply; sending empty reply"
                    );
                    Vec::new()
                })
        }
    }
}

mod blob {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
