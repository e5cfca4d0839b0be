use serde::{Deserialize, Serialize};

use crate::{ActionUuid, CategoryUuid, ExitUuid, NodeUuid};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub uuid: NodeUuid,
  /// Action envelopes, each tagged with a `type` discriminator.
  #[serde(default)]
  pub actions: Vec<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub router: Option<RouterDef>,
  /// Wait envelope, tagged with a `type` discriminator.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub wait: Option<serde_json::Value>,
  #[serde(default)]
  pub exits: Vec<ExitDef>,
}

impl NodeDef {
  /// UUID of the action at `index`, if its envelope carries one.
  pub fn action_uuid(&self, index: usize) -> Option<ActionUuid> {
    self
      .actions
      .get(index)
      .and_then(|a| a.get("uuid"))
      .and_then(|u| u.as_str())
      .map(str::to_string)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitDef {
  pub uuid: ExitUuid,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  #[serde(default)]
  pub destination_node_uuid: Option<NodeUuid>,
}

/// Routing logic evaluated when a run leaves a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouterDef {
  /// Tests an evaluated operand against each case in order; the first match
  /// picks its category, otherwise the default category is used.
  Switch {
    operand: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result_name: Option<String>,
    categories: Vec<CategoryDef>,
    #[serde(default)]
    cases: Vec<CaseDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_category_uuid: Option<CategoryUuid>,
  },
}

impl RouterDef {
  pub fn categories(&self) -> &[CategoryDef] {
    match self {
      RouterDef::Switch { categories, .. } => categories,
    }
  }

  pub fn result_name(&self) -> Option<&str> {
    match self {
      RouterDef::Switch { result_name, .. } => result_name.as_deref(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDef {
  pub uuid: CategoryUuid,
  pub name: String,
  pub exit_uuid: ExitUuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDef {
  pub uuid: String,
  /// Name of the test, e.g. `has_any_word` or `has_number_between`.
  #[serde(rename = "type")]
  pub test: String,
  #[serde(default)]
  pub arguments: Vec<String>,
  pub category_uuid: CategoryUuid,
}
