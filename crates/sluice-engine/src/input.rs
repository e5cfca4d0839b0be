//! Messages and dial outcomes that flow in and out of a session.

use serde::{Deserialize, Serialize};
use serde_json::json;
use sluice_assets::ChannelReference;
use sluice_config::RedactionPolicy;

use crate::urn::Urn;

/// An incoming message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgIn {
  pub uuid: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub urn: Option<Urn>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub channel: Option<ChannelReference>,
  #[serde(default)]
  pub text: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub attachments: Vec<String>,
}

impl MsgIn {
  pub fn new(uuid: impl Into<String>, text: impl Into<String>) -> Self {
    Self {
      uuid: uuid.into(),
      urn: None,
      channel: None,
      text: text.into(),
      attachments: Vec::new(),
    }
  }
}

/// An outgoing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MsgOut {
  pub uuid: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub urn: Option<Urn>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub channel: Option<ChannelReference>,
  pub text: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub attachments: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub quick_replies: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialStatus {
  Answered,
  NoAnswer,
  Busy,
  Failed,
}

/// The outcome of dialing a contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dial {
  pub status: DialStatus,
  #[serde(default)]
  pub duration: u32,
}

/// What a run last received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Input {
  Msg(MsgIn),
  Dial(Dial),
}

impl Input {
  /// The input as text, for routing and results.
  pub fn text(&self) -> String {
    match self {
      Input::Msg(msg) => msg.text.clone(),
      Input::Dial(dial) => serde_json::to_value(dial.status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default(),
    }
  }

  pub fn to_context(&self, redaction: RedactionPolicy) -> serde_json::Value {
    match self {
      Input::Msg(msg) => json!({
        "type": "msg",
        "uuid": msg.uuid,
        "text": msg.text,
        "attachments": msg.attachments,
        "urn": msg.urn.as_ref().map(|u| match redaction {
          RedactionPolicy::Urns => u.redacted(),
          RedactionPolicy::None => u.identity(),
        }),
        "channel": msg.channel.as_ref().map(|c| &c.name),
      }),
      Input::Dial(dial) => json!({
        "type": "dial",
        "text": self.text(),
        "status": dial.status,
        "duration": dial.duration,
      }),
    }
  }
}
