use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Event, EventBase};
use crate::typed;
use crate::urn::Urn;

/// The session is waiting for a message from the contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgWaitEvent {
  #[serde(flatten)]
  pub base: EventBase,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_seconds: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub expires_on: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hint: Option<String>,
}

typed!(MsgWaitEvent, "msg_wait");

impl Event for MsgWaitEvent {
  fn base(&self) -> &EventBase {
    &self.base
  }
}

/// Control is handed back to the caller without waiting for anything in
/// particular.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NothingWaitEvent {
  #[serde(flatten)]
  pub base: EventBase,
}

typed!(NothingWaitEvent, "nothing_wait");

impl Event for NothingWaitEvent {
  fn base(&self) -> &EventBase {
    &self.base
  }
}

/// The session is waiting for a call to the contact to finish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialWaitEvent {
  #[serde(flatten)]
  pub base: EventBase,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub urn: Option<Urn>,
}

typed!(DialWaitEvent, "dial_wait");

impl Event for DialWaitEvent {
  fn base(&self) -> &EventBase {
    &self.base
  }
}
