//! Typed, read-only view of the assets a session runs against.

use std::collections::HashMap;
use std::sync::Arc;

use sluice_assets::{
  AssetError, AssetReference, AssetSource, Classifier, Field, Group, Label, Location, Resthook,
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::channels::ChannelAssets;
use crate::error::EngineError;
use crate::flow::Flow;
use crate::registry::Registries;

/// Asset sets are loaded up front so a session fails fast when any is
/// unavailable. Flows are loaded on first use, then kept.
pub struct SessionAssets {
  source: Arc<dyn AssetSource>,
  registries: Arc<Registries>,
  channels: ChannelAssets,
  classifiers: Vec<Classifier>,
  fields: Vec<Field>,
  groups: Vec<Group>,
  labels: Vec<Label>,
  locations: Vec<Location>,
  resthooks: Vec<Resthook>,
  flows: Mutex<HashMap<String, Arc<Flow>>>,
}

impl SessionAssets {
  pub async fn new(
    source: Arc<dyn AssetSource>,
    registries: Arc<Registries>,
  ) -> Result<Self, AssetError> {
    let (channels, classifiers, fields, groups, labels, locations, resthooks) = futures::try_join!(
      source.channels(),
      source.classifiers(),
      source.fields(),
      source.groups(),
      source.labels(),
      source.locations(),
      source.resthooks(),
    )?;

    debug!(
      channels = channels.len(),
      fields = fields.len(),
      groups = groups.len(),
      "session assets loaded"
    );

    Ok(Self {
      source,
      registries,
      channels: ChannelAssets::new(channels),
      classifiers,
      fields,
      groups,
      labels,
      locations,
      resthooks,
      flows: Mutex::new(HashMap::new()),
    })
  }

  pub fn channels(&self) -> &ChannelAssets {
    &self.channels
  }

  pub fn classifier(&self, uuid: &str) -> Option<&Classifier> {
    self.classifiers.iter().find(|c| c.uuid == uuid)
  }

  pub fn field(&self, key: &str) -> Option<&Field> {
    self.fields.iter().find(|f| f.key == key)
  }

  pub fn fields(&self) -> &[Field] {
    &self.fields
  }

  pub fn group(&self, uuid: &str) -> Option<&Group> {
    self.groups.iter().find(|g| g.uuid == uuid)
  }

  pub fn groups(&self) -> &[Group] {
    &self.groups
  }

  pub fn label(&self, uuid: &str) -> Option<&Label> {
    self.labels.iter().find(|l| l.uuid == uuid)
  }

  pub fn locations(&self) -> &[Location] {
    &self.locations
  }

  pub fn resthook(&self, slug: &str) -> Option<&Resthook> {
    self.resthooks.iter().find(|r| r.slug == slug)
  }

  /// Get a flow, fetching and reading it the first time it's asked for.
  ///
  /// The lock is only held to look up and store, so unrelated flows load
  /// concurrently. Concurrent loads of the same flow all get the first
  /// stored copy.
  pub async fn flow(&self, uuid: &str) -> Result<Arc<Flow>, EngineError> {
    if let Some(flow) = self.flows.lock().await.get(uuid) {
      return Ok(flow.clone());
    }

    let def = self.source.flow(uuid).await?;
    let flow = Flow::from_def(def, &self.registries).map_err(|source| EngineError::Flow {
      flow_uuid: uuid.to_string(),
      source,
    })?;

    let mut flows = self.flows.lock().await;
    let flow = flows
      .entry(uuid.to_string())
      .or_insert_with(|| Arc::new(flow))
      .clone();
    Ok(flow)
  }

  /// Whether the referenced asset exists. Flows are fetched to find out: a
  /// flow the source doesn't have is missing, any other failure to load it
  /// is returned.
  pub async fn has(&self, reference: &AssetReference) -> Result<bool, EngineError> {
    Ok(match reference {
      AssetReference::Channel(r) => self.channels.get(&r.uuid).is_some(),
      AssetReference::Classifier(r) => self.classifier(&r.uuid).is_some(),
      AssetReference::Field(r) => self.field(&r.key).is_some(),
      AssetReference::Flow(r) => match self.flow(&r.uuid).await {
        Ok(_) => true,
        Err(EngineError::Asset(AssetError::ItemNotFound { .. }))
        | Err(EngineError::Asset(AssetError::Status { status: 404, .. })) => false,
        Err(e) => return Err(e),
      },
      AssetReference::Group(r) => self.group(&r.uuid).is_some(),
      AssetReference::Label(r) => self.label(&r.uuid).is_some(),
    })
  }
}
