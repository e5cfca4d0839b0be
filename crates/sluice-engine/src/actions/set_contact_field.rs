use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sluice_assets::{AssetError, AssetReference, AssetType, FieldReference};

use super::Action;
use crate::assets::SessionAssets;
use crate::context::ActionContext;
use crate::contact::FieldValue;
use crate::error::ActionError;
use crate::modifiers::FieldModifier;
use crate::typed;

/// Sets a contact field to the evaluated value. An empty value clears the
/// field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetContactFieldAction {
  pub uuid: String,
  pub field: FieldReference,
  #[serde(default)]
  pub value: String,
}

typed!(SetContactFieldAction, "set_contact_field");

#[async_trait]
impl Action for SetContactFieldAction {
  fn uuid(&self) -> &str {
    &self.uuid
  }

  fn validate(&self, assets: &SessionAssets) -> Result<(), ActionError> {
    assets.field(&self.field.key).ok_or_else(|| AssetError::ItemNotFound {
      asset_type: AssetType::Field,
      uuid: self.field.key.clone(),
    })?;
    Ok(())
  }

  async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
    ctx.require_contact()?;

    let Some(field) = ctx.assets().field(&self.field.key).cloned() else {
      ctx.log_error(format!("missing dependency: {}", self.field));
      return Ok(());
    };

    let text = ctx.evaluate(&self.value);
    let value = FieldValue::parse(&text, field.value_type, ctx.assets().locations());
    ctx.apply_modifier(Box::new(FieldModifier {
      field: field.reference(),
      value,
    }))
  }

  fn references(&self) -> Vec<AssetReference> {
    vec![AssetReference::Field(self.field.clone())]
  }
}
