//! Static inspection of flows against the assets they'd run with.

use serde::{Deserialize, Serialize};
use sluice_assets::AssetReference;

use crate::assets::SessionAssets;
use crate::error::EngineError;
use crate::flow::Flow;

pub const ISSUE_MISSING_DEPENDENCY: &str = "missing_dependency";

/// A problem found in a flow that doesn't stop it from being read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
  #[serde(rename = "type")]
  pub issue_type: String,
  pub node_uuid: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub action_uuid: Option<String>,
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub dependency: Option<AssetReference>,
}

/// Report every asset reference in the flow that the assets can't satisfy.
/// Each reference is checked once, in the order the flow makes them.
///
/// A referenced flow that exists but can't be fetched or read is an error,
/// not an issue.
pub async fn check_dependencies(
  flow: &Flow,
  assets: &SessionAssets,
) -> Result<Vec<Issue>, EngineError> {
  let mut issues = Vec::new();
  for extracted in flow.extract_references() {
    if assets.has(&extracted.reference).await? {
      continue;
    }
    issues.push(Issue {
      issue_type: ISSUE_MISSING_DEPENDENCY.to_string(),
      node_uuid: extracted.node_uuid,
      action_uuid: extracted.action_uuid,
      description: format!(
        "missing {} dependency '{}'",
        extracted.reference.asset_type(),
        extracted.reference.identity()
      ),
      dependency: Some(extracted.reference),
    });
  }
  Ok(issues)
}
