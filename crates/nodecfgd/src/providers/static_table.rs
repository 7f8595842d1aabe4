//! Provider serving fixed per-node blobs from the system settings.

use std::collections::BTreeMap;

use nodecfg_config::SystemSettings;

use super::{ConfigProvider, NodeId, ProviderConfigError, ProviderError, ProviderKind};

const NODES_KEY: &str = "nodes";
const DEFAULT_KEY: &str = "default";
const NOT_FOUND: i32 = 404;

/// Provider reading its table from the `[<kind>]` settings section.
///
/// ```toml
/// [lnp]
/// default = "lnp-common"
///
/// [lnp.nodes]
/// "7" = "lnp-node-7"
/// ```
///
/// Nodes absent from the table receive the `default` blob when one is set.
#[derive(Debug)]
pub struct StaticTableProvider {
    kind: ProviderKind,
    nodes: BTreeMap<NodeId, Vec<u8>>,
    fallback: Option<Vec<u8>>,
}

impl StaticTableProvider {
    /// Builds an unconfigured provider for `kind`.
    #[must_use]
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            nodes: BTreeMap::new(),
            fallback: None,
        }
    }
}

impl ConfigProvider for StaticTableProvider {
    fn configure(&mut self, settings: &SystemSettings) -> Result<(), ProviderConfigError> {
        let kind = self.kind;
        let section = settings.section(kind.as_str()).ok_or_else(|| {
            ProviderConfigError::new(format!("system settings have no [{kind}] section"))
        })?;

        let nodes = read_nodes(kind, section)?;
        let fallback = section
            .get(DEFAULT_KEY)
            .map(|value| read_blob(kind, DEFAULT_KEY, value))
            .transpose()?;
        if nodes.is_empty() && fallback.is_none() {
            return Err(ProviderConfigError::new(format!(
                "[{kind}] defines neither {NODES_KEY} nor {DEFAULT_KEY}"
            )));
        }

        self.nodes = nodes;
        self.fallback = fallback;
        Ok(())
    }

    fn serialize(&self, node_id: NodeId) -> Result<Vec<u8>, ProviderError> {
        self.nodes
            .get(&node_id)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| {
                ProviderError::new(NOT_FOUND, format!("no configuration for node {node_id}"))
            })
    }

    fn show(&self) -> String {
        let ids: Vec<String> = self.nodes.keys().map(ToString::to_string).collect();
        let fallback = if self.fallback.is_some() { "yes" } else { "no" };
        format!(
            "{}: nodes [{}], default: {fallback}",
            self.kind,
            ids.join(", ")
        )
    }
}

fn read_nodes(
    kind: ProviderKind,
    section: &toml::Table,
) -> Result<BTreeMap<NodeId, Vec<u8>>, ProviderConfigError> {
    let Some(value) = section.get(NODES_KEY) else {
        return Ok(BTreeMap::new());
    };
    let table = value.as_table().ok_or_else(|| {
        ProviderConfigError::new(format!("[{kind}] {NODES_KEY} must be a table"))
    })?;

    table
        .iter()
        .map(|(key, value)| {
            let node_id = key.trim().parse::<NodeId>().map_err(|source| {
                ProviderConfigError::with_source(format!("[{kind}] invalid node id '{key}'"), source)
            })?;
            Ok((node_id, read_blob(kind, key, value)?))
        })
        .collect()
}

fn read_blob(
    kind: ProviderKind,
    key: &str,
    value: &toml::Value,
) -> Result<Vec<u8>, ProviderConfigError> {
    value
        .as_str()
        .map(|blob| blob.as_bytes().to_vec())
        .ok_or_else(|| ProviderConfigError::new(format!("[{kind}] {key} must be a string")))
}
