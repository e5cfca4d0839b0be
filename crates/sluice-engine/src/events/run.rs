use serde::{Deserialize, Serialize};
use sluice_assets::FlowReference;

use super::{Event, EventBase};
use crate::contact::Contact;
use crate::results::RunResult;
use crate::run::Run;
use crate::typed;

/// Something went wrong. Fatal errors stop the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
  #[serde(flatten)]
  pub base: EventBase,
  pub text: String,
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub fatal: bool,
}

typed!(ErrorEvent, "error");

impl Event for ErrorEvent {
  fn base(&self) -> &EventBase {
    &self.base
  }
}

/// A run result was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResultChangedEvent {
  #[serde(flatten)]
  pub base: EventBase,
  pub name: String,
  pub value: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub category: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub input: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub extra: Option<serde_json::Value>,
  pub node_uuid: String,
}

impl RunResultChangedEvent {
  pub fn new(base: EventBase, result: &RunResult) -> Self {
    Self {
      base,
      name: result.name.clone(),
      value: result.value.clone(),
      category: result.category.clone(),
      input: result.input.clone(),
      extra: result.extra.clone(),
      node_uuid: result.node_uuid.clone(),
    }
  }
}

typed!(RunResultChangedEvent, "run_result_changed");

impl Event for RunResultChangedEvent {
  fn base(&self) -> &EventBase {
    &self.base
  }

  fn apply(&self, run: &mut Run, _contact: Option<&mut Contact>) {
    run.save_result(RunResult {
      name: self.name.clone(),
      value: self.value.clone(),
      category: self.category.clone(),
      input: self.input.clone(),
      extra: self.extra.clone(),
      node_uuid: self.node_uuid.clone(),
      created_on: self.base.created_on,
    });
  }
}

/// A run entered a sub-flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowEnteredEvent {
  #[serde(flatten)]
  pub base: EventBase,
  pub flow: FlowReference,
  pub parent_run_uuid: String,
  #[serde(default)]
  pub terminal: bool,
}

typed!(FlowEnteredEvent, "flow_entered");

impl Event for FlowEnteredEvent {
  fn base(&self) -> &EventBase {
    &self.base
  }
}

/// A waiting run expired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunExpiredEvent {
  #[serde(flatten)]
  pub base: EventBase,
  pub run_uuid: String,
}

typed!(RunExpiredEvent, "run_expired");

impl Event for RunExpiredEvent {
  fn base(&self) -> &EventBase {
    &self.base
  }
}
