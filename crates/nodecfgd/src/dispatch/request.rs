//! Request envelope sent by nodes.

use serde::{Deserialize, Serialize};

use crate::providers::NodeId;

use super::errors::DispatchError;

/// Legacy part name still sent by older nodes.
const LEGACY_SIGNALLING_ALIAS: &str = "sig_yeti";
const SIGNALLING_PART: &str = "signalling";

/// A configuration fetch: one part for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgRequest {
    /// Name of the configuration part.
    pub cfg_part: String,
    /// Node the configuration is rendered for.
    pub node_id: NodeId,
}

impl CfgRequest {
    /// Builds a request.
    pub fn new(cfg_part: impl Into<String>, node_id: NodeId) -> Self {
        Self {
            cfg_part: cfg_part.into(),
            node_id,
        }
    }

    /// Decodes a request line. Surrounding whitespace, including the
    /// trailing newline, is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Decode`] when the line is not a request.
    pub fn parse(line: &[u8]) -> Result<Self, DispatchError> {
        serde_json::from_slice(line.trim_ascii())
            .map_err(|source| DispatchError::Decode { source })
    }

    /// Part name used for the registry lookup, after alias resolution.
    #[must_use]
    pub fn resolved_part(&self) -> &str {
        if self.cfg_part == LEGACY_SIGNALLING_ALIAS {
            SIGNALLING_PART
        } else {
            &self.cfg_part
        }
    }

    /// Encodes the request as a single JSON line.
    ///
    /// # Errors
    ///
    /// Returns the serialisation error, which cannot occur for this type in
    /// practice.
    pub fn to_line(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }
}
