use async_trait::async_trait;
use sluice_config::FlowDef;

use crate::error::AssetError;
use crate::types::{Channel, Classifier, Field, Group, Label, Location, Resthook};

/// Provides the assets a session runs against.
///
/// Sets are returned whole; flows are fetched one at a time by UUID since
/// they can be large and are only needed when a session enters them.
#[async_trait]
pub trait AssetSource: Send + Sync {
  async fn channels(&self) -> Result<Vec<Channel>, AssetError>;

  async fn classifiers(&self) -> Result<Vec<Classifier>, AssetError>;

  async fn fields(&self) -> Result<Vec<Field>, AssetError>;

  async fn groups(&self) -> Result<Vec<Group>, AssetError>;

  async fn labels(&self) -> Result<Vec<Label>, AssetError>;

  async fn locations(&self) -> Result<Vec<Location>, AssetError>;

  async fn resthooks(&self) -> Result<Vec<Resthook>, AssetError>;

  /// Fetch a single flow definition.
  async fn flow(&self, uuid: &str) -> Result<FlowDef, AssetError>;

  /// Whether this source can provide location hierarchies at all.
  fn has_locations(&self) -> bool;
}
