//! Triggers: what starts a session.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sluice_assets::FlowReference;

use crate::input::{Input, MsgIn};
use crate::registry::{self, Registry, Typed};
use crate::typed;

pub trait Trigger: Typed + fmt::Debug + Send + Sync {
  /// The flow the session starts in.
  fn flow(&self) -> &FlowReference;

  fn triggered_on(&self) -> DateTime<Utc>;

  /// Input the root run starts with.
  fn input(&self) -> Option<Input> {
    None
  }

  /// The trigger as template expressions see it.
  fn context(&self) -> serde_json::Value {
    json!({ "type": self.type_name() })
  }

  fn clone_box(&self) -> Box<dyn Trigger>;
}

impl Clone for Box<dyn Trigger> {
  fn clone(&self) -> Self {
    self.clone_box()
  }
}

/// Started by a user, optionally with parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualTrigger {
  pub flow: FlowReference,
  pub triggered_on: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub params: Option<serde_json::Value>,
}

impl ManualTrigger {
  pub fn new(flow: FlowReference, triggered_on: DateTime<Utc>) -> Self {
    Self {
      flow,
      triggered_on,
      params: None,
    }
  }
}

typed!(ManualTrigger, "manual");

impl Trigger for ManualTrigger {
  fn flow(&self) -> &FlowReference {
    &self.flow
  }

  fn triggered_on(&self) -> DateTime<Utc> {
    self.triggered_on
  }

  fn context(&self) -> serde_json::Value {
    json!({ "type": "manual", "params": self.params })
  }

  fn clone_box(&self) -> Box<dyn Trigger> {
    Box::new(self.clone())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordMatchType {
  FirstWord,
  OnlyWord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatch {
  #[serde(rename = "type")]
  pub match_type: KeywordMatchType,
  pub keyword: String,
}

/// Started by an incoming message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgTrigger {
  pub flow: FlowReference,
  pub triggered_on: DateTime<Utc>,
  pub msg: MsgIn,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub keyword_match: Option<KeywordMatch>,
}

typed!(MsgTrigger, "msg");

impl Trigger for MsgTrigger {
  fn flow(&self) -> &FlowReference {
    &self.flow
  }

  fn triggered_on(&self) -> DateTime<Utc> {
    self.triggered_on
  }

  fn input(&self) -> Option<Input> {
    Some(Input::Msg(self.msg.clone()))
  }

  fn context(&self) -> serde_json::Value {
    json!({
      "type": "msg",
      "keyword": self.keyword_match.as_ref().map(|k| &k.keyword),
    })
  }

  fn clone_box(&self) -> Box<dyn Trigger> {
    Box::new(self.clone())
  }
}

/// Started from another session's flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowActionTrigger {
  pub flow: FlowReference,
  pub triggered_on: DateTime<Utc>,
  /// Summary of the run that started this session.
  pub run_summary: serde_json::Value,
}

typed!(FlowActionTrigger, "flow_action");

impl Trigger for FlowActionTrigger {
  fn flow(&self) -> &FlowReference {
    &self.flow
  }

  fn triggered_on(&self) -> DateTime<Utc> {
    self.triggered_on
  }

  fn context(&self) -> serde_json::Value {
    json!({ "type": "flow_action", "run": self.run_summary })
  }

  fn clone_box(&self) -> Box<dyn Trigger> {
    Box::new(self.clone())
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignReference {
  pub uuid: String,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignEvent {
  pub uuid: String,
  pub campaign: CampaignReference,
}

/// Started by a campaign event firing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignTrigger {
  pub flow: FlowReference,
  pub triggered_on: DateTime<Utc>,
  pub event: CampaignEvent,
}

typed!(CampaignTrigger, "campaign");

impl Trigger for CampaignTrigger {
  fn flow(&self) -> &FlowReference {
    &self.flow
  }

  fn triggered_on(&self) -> DateTime<Utc> {
    self.triggered_on
  }

  fn context(&self) -> serde_json::Value {
    json!({ "type": "campaign", "campaign": self.event.campaign.name })
  }

  fn clone_box(&self) -> Box<dyn Trigger> {
    Box::new(self.clone())
  }
}

pub(crate) fn register_builtins(registry: &mut Registry<dyn Trigger>) {
  registry.register("campaign", registry::trigger::<CampaignTrigger>);
  registry.register("flow_action", registry::trigger::<FlowActionTrigger>);
  registry.register("manual", registry::trigger::<ManualTrigger>);
  registry.register("msg", registry::trigger::<MsgTrigger>);
}
