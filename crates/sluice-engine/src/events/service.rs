use serde::{Deserialize, Serialize};
use sluice_assets::ClassifierReference;

use super::{Event, EventBase};
use crate::services::HttpLog;
use crate::typed;

/// A classifier was called. Carries the HTTP traces of the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierCalledEvent {
  #[serde(flatten)]
  pub base: EventBase,
  pub classifier: ClassifierReference,
  pub http_logs: Vec<HttpLog>,
}

typed!(ClassifierCalledEvent, "classifier_called");

impl Event for ClassifierCalledEvent {
  fn base(&self) -> &EventBase {
    &self.base
  }
}
