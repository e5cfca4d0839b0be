//! Sessions, sprints and their persisted form.

use std::fmt;

use serde::{Deserialize, Serialize};
use sluice_config::Environment;

use crate::contact::Contact;
use crate::error::DecodeError;
use crate::events::Event;
use crate::modifiers::Modifier;
use crate::registry::{Registries, Typed};
use crate::run::{Run, RunStatus};
use crate::triggers::Trigger;
use crate::waits::Wait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
  Active,
  Waiting,
  Completed,
  Errored,
}

impl fmt::Display for SessionStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      SessionStatus::Active => "active",
      SessionStatus::Waiting => "waiting",
      SessionStatus::Completed => "completed",
      SessionStatus::Errored => "errored",
    };
    f.write_str(s)
  }
}

/// A contact's interaction across one or more flows.
#[derive(Debug, Clone)]
pub struct Session {
  pub uuid: String,
  pub environment: Environment,
  pub trigger: Option<Box<dyn Trigger>>,
  pub contact: Option<Contact>,
  /// Every run of the session in creation order. Runs that are active or
  /// waiting form the call stack, innermost last.
  pub runs: Vec<Run>,
  pub wait: Option<Box<dyn Wait>>,
  pub status: SessionStatus,
}

impl Session {
  pub fn new(uuid: impl Into<String>, environment: Environment, contact: Option<Contact>) -> Self {
    Self {
      uuid: uuid.into(),
      environment,
      trigger: None,
      contact,
      runs: Vec::new(),
      wait: None,
      status: SessionStatus::Active,
    }
  }

  pub fn run(&self, uuid: &str) -> Option<&Run> {
    self.runs.iter().find(|r| r.uuid == uuid)
  }

  pub(crate) fn run_index(&self, uuid: &str) -> Option<usize> {
    self.runs.iter().position(|r| r.uuid == uuid)
  }

  /// Index of the innermost run that is still active or waiting.
  pub(crate) fn current_run_index(&self) -> Option<usize> {
    self
      .runs
      .iter()
      .rposition(|r| matches!(r.status, RunStatus::Active | RunStatus::Waiting) && r.child_uuid.is_none())
  }

  /// The run waiting on a resume, if any.
  pub fn waiting_run(&self) -> Option<&Run> {
    self.runs.iter().rev().find(|r| r.status == RunStatus::Waiting)
  }

  /// The persisted form of the session.
  pub fn to_json(&self) -> serde_json::Value {
    let envelope = SessionEnvelope {
      uuid: self.uuid.clone(),
      environment: self.environment.clone(),
      trigger: self.trigger.as_ref().map(|t| t.to_json()),
      contact: self.contact.clone(),
      runs: self.runs.clone(),
      wait: self.wait.as_ref().map(|w| w.to_json()),
      status: self.status,
    };
    serde_json::to_value(envelope).unwrap_or(serde_json::Value::Null)
  }

  /// Read a persisted session. The trigger and wait are decoded with
  /// `registries`; everything else is restored as written.
  pub fn read(data: &[u8], registries: &Registries) -> Result<Self, DecodeError> {
    let envelope: SessionEnvelope = serde_json::from_slice(data)?;
    Ok(Self {
      uuid: envelope.uuid,
      environment: envelope.environment,
      trigger: envelope
        .trigger
        .map(|t| registries.triggers.decode(t))
        .transpose()?,
      contact: envelope.contact,
      runs: envelope.runs,
      wait: envelope
        .wait
        .map(|w| registries.waits.decode(w))
        .transpose()?,
      status: envelope.status,
    })
  }
}

#[derive(Serialize, Deserialize)]
struct SessionEnvelope {
  uuid: String,
  #[serde(default)]
  environment: Environment,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  trigger: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  contact: Option<Contact>,
  #[serde(default)]
  runs: Vec<Run>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  wait: Option<serde_json::Value>,
  status: SessionStatus,
}

/// The events and modifiers produced by one engine call.
#[derive(Debug, Default)]
pub struct Sprint {
  events: Vec<Box<dyn Event>>,
  modifiers: Vec<Box<dyn Modifier>>,
}

impl Sprint {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn events(&self) -> &[Box<dyn Event>] {
    &self.events
  }

  pub fn modifiers(&self) -> &[Box<dyn Modifier>] {
    &self.modifiers
  }

  pub(crate) fn push_event(&mut self, event: Box<dyn Event>) {
    self.events.push(event);
  }

  pub(crate) fn push_modifier(&mut self, modifier: Box<dyn Modifier>) {
    self.modifiers.push(modifier);
  }

  /// Type tags of the events, in order.
  pub fn event_types(&self) -> Vec<&'static str> {
    self.events.iter().map(|e| e.type_name()).collect()
  }

  pub fn to_json(&self) -> serde_json::Value {
    serde_json::json!({
      "events": self.events.iter().map(|e| e.to_json()).collect::<Vec<_>>(),
      "modifiers": self.modifiers.iter().map(|m| m.to_json()).collect::<Vec<_>>(),
    })
  }
}
