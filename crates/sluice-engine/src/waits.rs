//! Waits: points where a session hands control back to its caller.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::contact::Contact;
use crate::events::{DialWaitEvent, Event, EventBase, MsgWaitEvent, NothingWaitEvent};
use crate::registry::{self, Registry, Typed};
use crate::resumes::Resume;
use crate::typed;
use crate::urn::TEL_SCHEME;

pub trait Wait: Typed + fmt::Debug + Send + Sync {
  /// Whether the resume can continue a session paused on this wait.
  /// Expirations are accepted by every wait.
  fn accepts(&self, resume: &dyn Resume) -> bool;

  /// The event announcing that the session is now waiting.
  fn begin(&self, base: EventBase, contact: Option<&Contact>) -> Box<dyn Event>;

  fn clone_box(&self) -> Box<dyn Wait>;
}

impl Clone for Box<dyn Wait> {
  fn clone(&self) -> Self {
    self.clone_box()
  }
}

/// Wait for a message from the contact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MsgWait {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timeout_seconds: Option<u32>,
  /// What kind of message is expected, e.g. `image` or `location`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hint: Option<String>,
}

typed!(MsgWait, "msg");

impl Wait for MsgWait {
  fn accepts(&self, resume: &dyn Resume) -> bool {
    resume.expires_run() || resume.type_name() == "msg"
  }

  fn begin(&self, base: EventBase, _contact: Option<&Contact>) -> Box<dyn Event> {
    let expires_on = self
      .timeout_seconds
      .map(|t| base.created_on + Duration::seconds(i64::from(t)));
    Box::new(MsgWaitEvent {
      base,
      timeout_seconds: self.timeout_seconds,
      expires_on,
      hint: self.hint.clone(),
    })
  }

  fn clone_box(&self) -> Box<dyn Wait> {
    Box::new(self.clone())
  }
}

/// Hand control back without expecting anything in particular.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NothingWait {}

typed!(NothingWait, "nothing");

impl Wait for NothingWait {
  fn accepts(&self, _resume: &dyn Resume) -> bool {
    true
  }

  fn begin(&self, base: EventBase, _contact: Option<&Contact>) -> Box<dyn Event> {
    Box::new(NothingWaitEvent { base })
  }

  fn clone_box(&self) -> Box<dyn Wait> {
    Box::new(self.clone())
  }
}

/// Wait for a call to the contact to finish.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialWait {}

typed!(DialWait, "dial");

impl Wait for DialWait {
  fn accepts(&self, resume: &dyn Resume) -> bool {
    resume.expires_run() || resume.type_name() == "dial"
  }

  fn begin(&self, base: EventBase, contact: Option<&Contact>) -> Box<dyn Event> {
    let urn = contact.and_then(|c| c.urns_with_scheme(TEL_SCHEME).next().cloned());
    Box::new(DialWaitEvent { base, urn })
  }

  fn clone_box(&self) -> Box<dyn Wait> {
    Box::new(self.clone())
  }
}

pub(crate) fn register_builtins(registry: &mut Registry<dyn Wait>) {
  registry.register("dial", registry::wait::<DialWait>);
  registry.register("msg", registry::wait::<MsgWait>);
  registry.register("nothing", registry::wait::<NothingWait>);
}
