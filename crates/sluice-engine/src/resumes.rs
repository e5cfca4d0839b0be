//! Resumes: what continues a waiting session.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::input::{Dial, Input, MsgIn};
use crate::registry::{self, Registry, Typed};
use crate::typed;

pub trait Resume: Typed + fmt::Debug + Send + Sync {
  fn resumed_on(&self) -> DateTime<Utc>;

  /// Input the waiting run continues with.
  fn input(&self) -> Option<Input> {
    None
  }

  /// Whether this resume ends the waiting run instead of continuing it.
  fn expires_run(&self) -> bool {
    false
  }
}

/// The contact replied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgResume {
  pub resumed_on: DateTime<Utc>,
  pub msg: MsgIn,
}

typed!(MsgResume, "msg");

impl Resume for MsgResume {
  fn resumed_on(&self) -> DateTime<Utc> {
    self.resumed_on
  }

  fn input(&self) -> Option<Input> {
    Some(Input::Msg(self.msg.clone()))
  }
}

/// A call finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialResume {
  pub resumed_on: DateTime<Utc>,
  pub dial: Dial,
}

typed!(DialResume, "dial");

impl Resume for DialResume {
  fn resumed_on(&self) -> DateTime<Utc> {
    self.resumed_on
  }

  fn input(&self) -> Option<Input> {
    Some(Input::Dial(self.dial.clone()))
  }
}

/// The waiting run timed out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunExpirationResume {
  pub resumed_on: DateTime<Utc>,
}

typed!(RunExpirationResume, "run_expiration");

impl Resume for RunExpirationResume {
  fn resumed_on(&self) -> DateTime<Utc> {
    self.resumed_on
  }

  fn expires_run(&self) -> bool {
    true
  }
}

pub(crate) fn register_builtins(registry: &mut Registry<dyn Resume>) {
  registry.register("dial", registry::resume::<DialResume>);
  registry.register("msg", registry::resume::<MsgResume>);
  registry.register("run_expiration", registry::resume::<RunExpirationResume>);
}
