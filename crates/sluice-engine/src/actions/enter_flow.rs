use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sluice_assets::{AssetReference, FlowReference};

use super::Action;
use crate::context::ActionContext;
use crate::error::ActionError;
use crate::typed;

/// Starts a child run in another flow. When `terminal` is set the current
/// run completes instead of waiting for the child to return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnterFlowAction {
  pub uuid: String,
  pub flow: FlowReference,
  #[serde(default)]
  pub terminal: bool,
}

typed!(EnterFlowAction, "enter_flow");

#[async_trait]
impl Action for EnterFlowAction {
  fn uuid(&self) -> &str {
    &self.uuid
  }

  async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
    ctx.enter_flow(self.flow.clone(), self.terminal);
    Ok(())
  }

  fn references(&self) -> Vec<AssetReference> {
    vec![AssetReference::Flow(self.flow.clone())]
  }
}
