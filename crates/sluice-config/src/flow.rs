use serde::{Deserialize, Serialize};

use crate::error::DefinitionError;
use crate::node::NodeDef;
use crate::FlowUuid;

/// A flow definition as authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDef {
  pub uuid: FlowUuid,
  pub name: String,
  #[serde(default)]
  pub language: String,
  /// Minutes of inactivity after which a waiting run of this flow expires.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub expire_after_minutes: Option<u32>,
  #[serde(default)]
  pub nodes: Vec<NodeDef>,
}

impl FlowDef {
  /// Get a node by UUID.
  pub fn get_node(&self, uuid: &str) -> Option<&NodeDef> {
    self.nodes.iter().find(|n| n.uuid == uuid)
  }
}

/// Read a flow definition from JSON, checking the fields the engine cannot do without.
pub fn read_flow(data: &[u8]) -> Result<FlowDef, DefinitionError> {
  let def: FlowDef = serde_json::from_slice(data)?;
  if def.uuid.is_empty() {
    return Err(DefinitionError::MissingField { field: "uuid" });
  }
  Ok(def)
}
