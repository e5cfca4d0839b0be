use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sluice_assets::{AssetError, AssetReference, AssetType, GroupReference};

use super::Action;
use crate::assets::SessionAssets;
use crate::context::ActionContext;
use crate::error::ActionError;
use crate::modifiers::{GroupsModification, GroupsModifier};
use crate::typed;

/// Removes the contact from the listed groups, or from every group it's a
/// member of when `all_groups` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveFromGroupAction {
  pub uuid: String,
  #[serde(default)]
  pub groups: Vec<GroupReference>,
  #[serde(default)]
  pub all_groups: bool,
}

typed!(RemoveFromGroupAction, "remove_from_group");

#[async_trait]
impl Action for RemoveFromGroupAction {
  fn uuid(&self) -> &str {
    &self.uuid
  }

  fn validate(&self, assets: &SessionAssets) -> Result<(), ActionError> {
    if self.all_groups && !self.groups.is_empty() {
      return Err(ActionError::Invalid(
        "can't specify groups when removing from all groups".to_string(),
      ));
    }
    for group in &self.groups {
      assets.group(&group.uuid).ok_or_else(|| AssetError::ItemNotFound {
        asset_type: AssetType::Group,
        uuid: group.uuid.clone(),
      })?;
    }
    Ok(())
  }

  async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
    let contact = ctx.require_contact()?;

    let groups: Vec<GroupReference> = if self.all_groups {
      // dynamic memberships are managed by their queries
      contact
        .groups
        .iter()
        .filter(|g| !ctx.assets().group(&g.uuid).is_some_and(|a| a.is_dynamic()))
        .cloned()
        .collect()
    } else {
      let mut groups = Vec::new();
      for reference in &self.groups {
        match ctx.assets().group(&reference.uuid).cloned() {
          Some(group) if group.is_dynamic() => {
            let text = format!("can't remove contacts from dynamic group '{}'", group.name);
            ctx.log_error(text);
          }
          Some(group) => groups.push(group.reference()),
          None => ctx.log_error(format!("missing dependency: {}", reference)),
        }
      }
      groups
    };

    if groups.is_empty() {
      return Ok(());
    }
    ctx.apply_modifier(Box::new(GroupsModifier {
      groups,
      modification: GroupsModification::Remove,
    }))
  }

  fn references(&self) -> Vec<AssetReference> {
    self.groups.iter().cloned().map(AssetReference::Group).collect()
  }
}
