use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sluice_assets::{AssetError, AssetReference, AssetType, GroupReference};

use super::Action;
use crate::assets::SessionAssets;
use crate::context::ActionContext;
use crate::error::ActionError;
use crate::modifiers::{GroupsModification, GroupsModifier};
use crate::typed;

/// Adds the contact to one or more groups.
///
/// ```json
/// {
///   "uuid": "8eebd020-1af5-431c-b943-aa670fc74da9",
///   "type": "add_to_group",
///   "groups": [{"uuid": "1e1ce1e1-9288-4504-869e-022d1003c72a", "name": "Customers"}]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddToGroupAction {
  pub uuid: String,
  pub groups: Vec<GroupReference>,
}

typed!(AddToGroupAction, "add_to_group");

#[async_trait]
impl Action for AddToGroupAction {
  fn uuid(&self) -> &str {
    &self.uuid
  }

  fn validate(&self, assets: &SessionAssets) -> Result<(), ActionError> {
    for group in &self.groups {
      let found = assets.group(&group.uuid).ok_or_else(|| AssetError::ItemNotFound {
        asset_type: AssetType::Group,
        uuid: group.uuid.clone(),
      })?;
      if found.is_dynamic() {
        return Err(ActionError::Invalid(format!(
          "can't add contacts to dynamic group '{}'",
          found.name
        )));
      }
    }
    Ok(())
  }

  async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
    ctx.require_contact()?;

    let mut groups = Vec::with_capacity(self.groups.len());
    for reference in &self.groups {
      match ctx.assets().group(&reference.uuid).cloned() {
        Some(group) if group.is_dynamic() => {
          let text = format!("can't add contacts to dynamic group '{}'", group.name);
          ctx.log_error(text);
        }
        Some(group) => groups.push(group.reference()),
        None => ctx.log_error(format!("missing dependency: {}", reference)),
      }
    }

    if groups.is_empty() {
      return Ok(());
    }
    ctx.apply_modifier(Box::new(GroupsModifier {
      groups,
      modification: GroupsModification::Add,
    }))
  }

  fn references(&self) -> Vec<AssetReference> {
    self.groups.iter().cloned().map(AssetReference::Group).collect()
  }
}
