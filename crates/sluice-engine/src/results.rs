//! Run results and the static description of the results a flow can produce.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CATEGORY_SUCCESS: &str = "Success";
pub const CATEGORY_SKIPPED: &str = "Skipped";
pub const CATEGORY_FAILURE: &str = "Failure";

/// A named value saved by a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
  pub name: String,
  pub value: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub input: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub extra: Option<serde_json::Value>,
  pub node_uuid: String,
  pub created_on: DateTime<Utc>,
}

/// The key a result name is stored under: lowercase, with runs of anything
/// that isn't a letter or digit collapsed to a single underscore.
pub fn result_key(name: &str) -> String {
  let mut key = String::with_capacity(name.len());
  let mut pending_sep = false;
  for c in name.chars() {
    if c.is_alphanumeric() {
      if pending_sep && !key.is_empty() {
        key.push('_');
      }
      pending_sep = false;
      key.extend(c.to_lowercase());
    } else {
      pending_sep = true;
    }
  }
  key
}

/// A result a flow may produce, found by static inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultInfo {
  pub key: String,
  pub name: String,
  pub categories: Vec<String>,
  pub node_uuids: Vec<String>,
}

impl ResultInfo {
  pub fn new(name: &str, categories: &[&str], node_uuid: &str) -> Self {
    Self {
      key: result_key(name),
      name: name.to_string(),
      categories: categories.iter().map(|c| c.to_string()).collect(),
      node_uuids: vec![node_uuid.to_string()],
    }
  }
}

/// Merge infos with the same key, keeping first-seen order of names,
/// categories and nodes.
pub fn merge_result_infos(infos: Vec<ResultInfo>) -> Vec<ResultInfo> {
  let mut merged: Vec<ResultInfo> = Vec::new();
  for info in infos {
    match merged.iter_mut().find(|m| m.key == info.key) {
      Some(existing) => {
        for category in info.categories {
          if !existing.categories.contains(&category) {
            existing.categories.push(category);
          }
        }
        for node in info.node_uuids {
          if !existing.node_uuids.contains(&node) {
            existing.node_uuids.push(node);
          }
        }
      }
      None => merged.push(info),
    }
  }
  merged
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_result_key() {
    assert_eq!(result_key("Favorite Color"), "favorite_color");
    assert_eq!(result_key("  Intent! "), "intent");
    assert_eq!(result_key("Age (years)"), "age_years");
  }

  #[test]
  fn test_merge_result_infos() {
    let merged = merge_result_infos(vec![
      ResultInfo::new("Intent", &[CATEGORY_SUCCESS, CATEGORY_FAILURE], "n1"),
      ResultInfo::new("Age", &[], "n1"),
      ResultInfo::new("intent", &[CATEGORY_SKIPPED, CATEGORY_FAILURE], "n2"),
    ]);

    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].name, "Intent");
    assert_eq!(merged[0].categories, vec!["Success", "Failure", "Skipped"]);
    assert_eq!(merged[0].node_uuids, vec!["n1", "n2"]);
  }
}
