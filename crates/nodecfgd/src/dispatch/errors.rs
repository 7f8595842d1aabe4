//! Error types for request dispatch failures.
//!
//! Every variant maps to the status code and reason returned to the
//! requesting node. Only provider failures carry a caller-supplied code and
//! message; the rest are normalised to fixed values.

use thiserror::Error;

use crate::providers::ProviderError;
use crate::registry::RegistryError;

/// Reason returned when a request cannot be decoded.
pub const DECODE_FAILURE_REASON: &str = "can't decode request";
/// Reason returned when no provider serves the requested part.
pub const UNKNOWN_PART_REASON: &str = "unknown cfg part";
/// Reason returned for failures inside the daemon itself.
pub const INTERNAL_ERROR_REASON: &str = "Internal Error";

const NOT_FOUND: i32 = 404;
const INTERNAL: i32 = 500;

/// Errors surfaced while routing a single request.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request line is not a valid request document.
    #[error("can't decode request: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },

    /// No provider is registered for the part.
    #[error("unknown cfg part '{part}'")]
    UnknownPart { part: String },

    /// The provider refused to render the configuration.
    #[error("provider for '{part}' failed: {source}")]
    Provider {
        part: String,
        #[source]
        source: ProviderError,
    },

    /// Internal error (e.g., lock poisoned).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl DispatchError {
    /// Status code sent to the node.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Decode { .. } | Self::Internal { .. } => INTERNAL,
            Self::UnknownPart { .. } => NOT_FOUND,
            Self::Provider { source, .. } => source.code,
        }
    }

    /// Reason sent to the node.
    #[must_use]
    pub fn reason(&self) -> &str {
        match self {
            Self::Decode { .. } => DECODE_FAILURE_REASON,
            Self::UnknownPart { .. } => UNKNOWN_PART_REASON,
            Self::Provider { source, .. } => source.message.as_str(),
            Self::Internal { .. } => INTERNAL_ERROR_REASON,
        }
    }

    /// Creates an unknown part error.
    pub fn unknown_part(part: impl Into<String>) -> Self {
        Self::UnknownPart { part: part.into() }
    }

    /// Wraps a provider failure for `part`.
    pub fn provider(part: impl Into<String>, source: ProviderError) -> Self {
        Self::Provider {
            part: part.into(),
            source,
        }
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<RegistryError> for DispatchError {
    fn from(error: RegistryError) -> Self {
        Self::internal(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn decode_error() -> DispatchError {
        let source = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        DispatchError::Decode { source }
    }

    #[rstest]
    #[case::decode(decode_error(), 500, "can't decode request")]
    #[case::unknown_part(DispatchError::unknown_part("billing"), 404, "unknown cfg part")]
    #[case::provider(
        DispatchError::provider("lnp", ProviderError::new(503, "lnp db offline")),
        503,
        "lnp db offline"
    )]
    #[case::poisoned(DispatchError::from(RegistryError::Poisoned), 500, "Internal Error")]
    fn maps_errors_to_wire_codes(
        #[case] error: DispatchError,
        #[case] code: i32,
        #[case] reason: &str,
    ) {
        assert_eq!(error.code(), code);
        assert_eq!(error.reason(), reason);
    }
}
