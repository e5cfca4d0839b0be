//! Asset source that serves everything from one in-memory document.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sluice_config::FlowDef;

use crate::asset_type::AssetType;
use crate::error::AssetError;
use crate::source::AssetSource;
use crate::types::{Channel, Classifier, Field, Group, Label, Location, Resthook};

/// All assets in a single JSON document, keyed by plural type name.
///
/// ```json
/// {"channels": [...], "flows": [...], "groups": [...]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaticSource {
  #[serde(default)]
  pub channels: Vec<Channel>,
  #[serde(default)]
  pub classifiers: Vec<Classifier>,
  #[serde(default)]
  pub fields: Vec<Field>,
  #[serde(default)]
  pub flows: Vec<FlowDef>,
  #[serde(default)]
  pub groups: Vec<Group>,
  #[serde(default)]
  pub labels: Vec<Label>,
  #[serde(default)]
  pub locations: Vec<Location>,
  #[serde(default)]
  pub resthooks: Vec<Resthook>,
}

impl StaticSource {
  pub fn from_json(data: &[u8]) -> Result<Self, AssetError> {
    serde_json::from_slice(data).map_err(|e| AssetError::InvalidSource(e.to_string()))
  }
}

#[async_trait]
impl AssetSource for StaticSource {
  async fn channels(&self) -> Result<Vec<Channel>, AssetError> {
    Ok(self.channels.clone())
  }

  async fn classifiers(&self) -> Result<Vec<Classifier>, AssetError> {
    Ok(self.classifiers.clone())
  }

  async fn fields(&self) -> Result<Vec<Field>, AssetError> {
    Ok(self.fields.clone())
  }

  async fn groups(&self) -> Result<Vec<Group>, AssetError> {
    Ok(self.groups.clone())
  }

  async fn labels(&self) -> Result<Vec<Label>, AssetError> {
    Ok(self.labels.clone())
  }

  async fn locations(&self) -> Result<Vec<Location>, AssetError> {
    Ok(self.locations.clone())
  }

  async fn resthooks(&self) -> Result<Vec<Resthook>, AssetError> {
    Ok(self.resthooks.clone())
  }

  async fn flow(&self, uuid: &str) -> Result<FlowDef, AssetError> {
    self
      .flows
      .iter()
      .find(|f| f.uuid == uuid)
      .cloned()
      .ok_or_else(|| AssetError::ItemNotFound {
        asset_type: AssetType::Flow,
        uuid: uuid.to_string(),
      })
  }

  fn has_locations(&self) -> bool {
    !self.locations.is_empty()
  }
}
