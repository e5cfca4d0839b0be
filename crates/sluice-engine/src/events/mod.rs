//! Events: immutable records of what happened during a sprint.
//!
//! Every event knows how to apply itself to a run and contact. Applying is
//! idempotent, so replaying a sprint's events over the state it started from
//! reproduces the state it ended in. Events that only record something
//! keep the default no-op.

mod contact;
mod msg;
mod run;
mod service;
mod wait;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::contact::Contact;
use crate::registry::{self, Registry, Typed};
use crate::run::Run;

pub use contact::{ContactFieldChangedEvent, ContactGroupsChangedEvent, UpdateContactEvent};
pub use msg::{DialEndedEvent, MsgCreatedEvent, MsgReceivedEvent};
pub use run::{ErrorEvent, FlowEnteredEvent, RunExpiredEvent, RunResultChangedEvent};
pub use service::ClassifierCalledEvent;
pub use wait::{DialWaitEvent, MsgWaitEvent, NothingWaitEvent};

/// Fields every event carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBase {
  pub created_on: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub step_uuid: Option<String>,
}

impl EventBase {
  pub fn new(created_on: DateTime<Utc>, step_uuid: Option<String>) -> Self {
    Self {
      created_on,
      step_uuid,
    }
  }
}

pub trait Event: Typed + fmt::Debug + Send + Sync {
  fn base(&self) -> &EventBase;

  fn created_on(&self) -> DateTime<Utc> {
    self.base().created_on
  }

  fn step_uuid(&self) -> Option<&str> {
    self.base().step_uuid.as_deref()
  }

  /// Apply this event to the run it was created in and the session contact.
  fn apply(&self, _run: &mut Run, _contact: Option<&mut Contact>) {}
}

pub(crate) fn register_builtins(registry: &mut Registry<dyn Event>) {
  registry.register("classifier_called", registry::event::<ClassifierCalledEvent>);
  registry.register("contact_field_changed", registry::event::<ContactFieldChangedEvent>);
  registry.register("contact_groups_changed", registry::event::<ContactGroupsChangedEvent>);
  registry.register("dial_ended", registry::event::<DialEndedEvent>);
  registry.register("dial_wait", registry::event::<DialWaitEvent>);
  registry.register("error", registry::event::<ErrorEvent>);
  registry.register("flow_entered", registry::event::<FlowEnteredEvent>);
  registry.register("msg_created", registry::event::<MsgCreatedEvent>);
  registry.register("msg_received", registry::event::<MsgReceivedEvent>);
  registry.register("msg_wait", registry::event::<MsgWaitEvent>);
  registry.register("nothing_wait", registry::event::<NothingWaitEvent>);
  registry.register("run_expired", registry::event::<RunExpiredEvent>);
  registry.register("run_result_changed", registry::event::<RunResultChangedEvent>);
  registry.register("update_contact", registry::event::<UpdateContactEvent>);
}
