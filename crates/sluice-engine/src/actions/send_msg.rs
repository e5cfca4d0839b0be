use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sluice_assets::ChannelRole;

use super::Action;
use crate::context::ActionContext;
use crate::error::ActionError;
use crate::events::MsgCreatedEvent;
use crate::input::MsgOut;
use crate::typed;
use crate::urn::Urn;

/// Sends a message to the contact.
///
/// The message goes to the contact's preferred URN, or to every URN that a
/// channel can send to when `all_urns` is set. If no URN is sendable a single
/// message is still created without a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMsgAction {
  pub uuid: String,
  pub text: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub attachments: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub quick_replies: Vec<String>,
  #[serde(default)]
  pub all_urns: bool,
}

typed!(SendMsgAction, "send_msg");

#[async_trait]
impl Action for SendMsgAction {
  fn uuid(&self) -> &str {
    &self.uuid
  }

  async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
    let contact = ctx.require_contact()?;

    let mut destinations: Vec<(Urn, sluice_assets::ChannelReference)> = Vec::new();
    for urn in &contact.urns {
      if let Some(channel) = ctx.assets().channels().resolve(urn, ChannelRole::Send) {
        destinations.push((urn.clone(), channel.reference()));
        if !self.all_urns {
          break;
        }
      }
    }

    let text = ctx.evaluate(&self.text);
    if text.trim().is_empty() {
      ctx.log_error("send_msg text evaluated to empty string, skipping");
      return Ok(());
    }
    let attachments = self.evaluate_all(ctx, &self.attachments);
    let quick_replies = self.evaluate_all(ctx, &self.quick_replies);

    if destinations.is_empty() {
      let msg = MsgOut {
        uuid: ctx.new_uuid(),
        urn: None,
        channel: None,
        text,
        attachments,
        quick_replies,
      };
      let event = MsgCreatedEvent {
        base: ctx.event_base(),
        msg,
      };
      ctx.log_event(Box::new(event));
      return Ok(());
    }

    for (urn, channel) in destinations {
      let msg = MsgOut {
        uuid: ctx.new_uuid(),
        urn: Some(urn),
        channel: Some(channel),
        text: text.clone(),
        attachments: attachments.clone(),
        quick_replies: quick_replies.clone(),
      };
      let event = MsgCreatedEvent {
        base: ctx.event_base(),
        msg,
      };
      ctx.log_event(Box::new(event));
    }
    Ok(())
  }
}

impl SendMsgAction {
  fn evaluate_all(&self, ctx: &mut ActionContext<'_>, templates: &[String]) -> Vec<String> {
    templates
      .iter()
      .map(|t| ctx.evaluate(t))
      .filter(|s| !s.is_empty())
      .collect()
  }
}
