use serde::{Deserialize, Serialize};
use sluice_assets::{FieldReference, GroupReference};

use super::{Event, EventBase};
use crate::contact::{Contact, FieldValue};
use crate::run::Run;
use crate::typed;

/// The contact was added to or removed from groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactGroupsChangedEvent {
  #[serde(flatten)]
  pub base: EventBase,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub groups_added: Vec<GroupReference>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub groups_removed: Vec<GroupReference>,
}

typed!(ContactGroupsChangedEvent, "contact_groups_changed");

impl Event for ContactGroupsChangedEvent {
  fn base(&self) -> &EventBase {
    &self.base
  }

  fn apply(&self, _run: &mut Run, contact: Option<&mut Contact>) {
    if let Some(contact) = contact {
      for group in &self.groups_added {
        contact.add_group(group.clone());
      }
      for group in &self.groups_removed {
        contact.remove_group(&group.uuid);
      }
    }
  }
}

/// A contact field was set or cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactFieldChangedEvent {
  #[serde(flatten)]
  pub base: EventBase,
  pub field: FieldReference,
  pub value: Option<FieldValue>,
}

typed!(ContactFieldChangedEvent, "contact_field_changed");

impl Event for ContactFieldChangedEvent {
  fn base(&self) -> &EventBase {
    &self.base
  }

  fn apply(&self, _run: &mut Run, contact: Option<&mut Contact>) {
    if let Some(contact) = contact {
      contact.set_field(&self.field, self.value.clone());
    }
  }
}

/// A built-in contact property changed. `field_name` is `name` or `language`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateContactEvent {
  #[serde(flatten)]
  pub base: EventBase,
  pub field_name: String,
  pub value: String,
}

typed!(UpdateContactEvent, "update_contact");

impl Event for UpdateContactEvent {
  fn base(&self) -> &EventBase {
    &self.base
  }

  fn apply(&self, _run: &mut Run, contact: Option<&mut Contact>) {
    if let Some(contact) = contact {
      match self.field_name.as_str() {
        "name" => contact.name = self.value.clone(),
        "language" => contact.language = self.value.clone(),
        _ => {}
      }
    }
  }
}
