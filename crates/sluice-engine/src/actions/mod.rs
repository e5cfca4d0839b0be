//! Actions: the steps a node performs when a run visits it.
//!
//! Actions never fail the engine call. Problems become error events and the
//! run continues, except for a missing contact which is fatal to the run.

mod add_to_group;
mod call_classifier;
mod enter_flow;
mod remove_from_group;
mod send_msg;
mod set_contact_field;
mod set_contact_language;
mod set_contact_name;
mod set_run_result;

use std::fmt;

use async_trait::async_trait;
use sluice_assets::AssetReference;

use crate::assets::SessionAssets;
use crate::context::ActionContext;
use crate::error::ActionError;
use crate::registry::{self, Registry, Typed};
use crate::results::ResultInfo;

pub use add_to_group::AddToGroupAction;
pub use call_classifier::CallClassifierAction;
pub use enter_flow::EnterFlowAction;
pub use remove_from_group::RemoveFromGroupAction;
pub use send_msg::SendMsgAction;
pub use set_contact_field::SetContactFieldAction;
pub use set_contact_language::SetContactLanguageAction;
pub use set_contact_name::SetContactNameAction;
pub use set_run_result::SetRunResultAction;

#[async_trait]
pub trait Action: Typed + fmt::Debug + Send + Sync {
  fn uuid(&self) -> &str;

  /// Check the action against the assets, independent of any contact.
  fn validate(&self, _assets: &SessionAssets) -> Result<(), ActionError> {
    Ok(())
  }

  async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError>;

  /// Report the results this action can save.
  fn results(&self, _node_uuid: &str, _include: &mut dyn FnMut(ResultInfo)) {}

  /// Assets this action depends on.
  fn references(&self) -> Vec<AssetReference> {
    Vec::new()
  }
}

pub(crate) fn register_builtins(registry: &mut Registry<dyn Action>) {
  registry.register("add_to_group", registry::action::<AddToGroupAction>);
  registry.register("call_classifier", registry::action::<CallClassifierAction>);
  registry.register("enter_flow", registry::action::<EnterFlowAction>);
  registry.register("remove_from_group", registry::action::<RemoveFromGroupAction>);
  registry.register("send_msg", registry::action::<SendMsgAction>);
  registry.register("set_contact_field", registry::action::<SetContactFieldAction>);
  registry.register("set_contact_language", registry::action::<SetContactLanguageAction>);
  registry.register("set_contact_name", registry::action::<SetContactNameAction>);
  registry.register("set_run_result", registry::action::<SetRunResultAction>);
}
