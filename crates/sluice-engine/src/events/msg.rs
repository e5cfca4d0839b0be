use serde::{Deserialize, Serialize};

use super::{Event, EventBase};
use crate::contact::Contact;
use crate::input::{Dial, Input, MsgIn, MsgOut};
use crate::run::Run;
use crate::typed;

/// A message was created to be sent to the contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgCreatedEvent {
  #[serde(flatten)]
  pub base: EventBase,
  pub msg: MsgOut,
}

typed!(MsgCreatedEvent, "msg_created");

impl Event for MsgCreatedEvent {
  fn base(&self) -> &EventBase {
    &self.base
  }
}

/// A message was received from the contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgReceivedEvent {
  #[serde(flatten)]
  pub base: EventBase,
  pub msg: MsgIn,
}

typed!(MsgReceivedEvent, "msg_received");

impl Event for MsgReceivedEvent {
  fn base(&self) -> &EventBase {
    &self.base
  }

  fn apply(&self, run: &mut Run, _contact: Option<&mut Contact>) {
    run.input = Some(Input::Msg(self.msg.clone()));
  }
}

/// A call to the contact ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialEndedEvent {
  #[serde(flatten)]
  pub base: EventBase,
  pub dial: Dial,
}

typed!(DialEndedEvent, "dial_ended");

impl Event for DialEndedEvent {
  fn base(&self) -> &EventBase {
    &self.base
  }

  fn apply(&self, run: &mut Run, _contact: Option<&mut Contact>) {
    run.input = Some(Input::Dial(self.dial.clone()));
  }
}
