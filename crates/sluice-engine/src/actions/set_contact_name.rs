use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Action;
use crate::context::ActionContext;
use crate::error::ActionError;
use crate::modifiers::NameModifier;
use crate::typed;

/// Sets the contact's name to the evaluated template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetContactNameAction {
  pub uuid: String,
  pub name: String,
}

typed!(SetContactNameAction, "set_contact_name");

#[async_trait]
impl Action for SetContactNameAction {
  fn uuid(&self) -> &str {
    &self.uuid
  }

  async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
    ctx.require_contact()?;
    let name = ctx.evaluate(&self.name).trim().to_string();
    ctx.apply_modifier(Box::new(NameModifier { name }))
  }
}
