use std::fmt;

use serde::{Deserialize, Serialize};

/// The kinds of asset a source can provide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
  Channel,
  Classifier,
  Field,
  Flow,
  Group,
  Label,
  LocationHierarchy,
  Resthook,
}

impl AssetType {
  pub fn as_str(&self) -> &'static str {
    match self {
      AssetType::Channel => "channel",
      AssetType::Classifier => "classifier",
      AssetType::Field => "field",
      AssetType::Flow => "flow",
      AssetType::Group => "group",
      AssetType::Label => "label",
      AssetType::LocationHierarchy => "location_hierarchy",
      AssetType::Resthook => "resthook",
    }
  }
}

impl fmt::Display for AssetType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
