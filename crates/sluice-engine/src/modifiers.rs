//! Modifiers: instructions to change a contact.
//!
//! Applying a modifier changes the contact and returns the events that
//! describe the change. A modifier that changes nothing returns no events.

use std::fmt;

use serde::{Deserialize, Serialize};
use sluice_assets::{FieldReference, GroupReference};

use crate::contact::{Contact, FieldValue};
use crate::events::{
  ContactFieldChangedEvent, ContactGroupsChangedEvent, Event, EventBase, UpdateContactEvent,
};
use crate::registry::{self, Registry, Typed};
use crate::typed;

pub trait Modifier: Typed + fmt::Debug + Send + Sync {
  fn apply(&self, contact: &mut Contact, base: &EventBase) -> Vec<Box<dyn Event>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupsModification {
  Add,
  Remove,
}

/// Adds the contact to or removes it from groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupsModifier {
  pub groups: Vec<GroupReference>,
  pub modification: GroupsModification,
}

typed!(GroupsModifier, "groups");

impl Modifier for GroupsModifier {
  fn apply(&self, contact: &mut Contact, base: &EventBase) -> Vec<Box<dyn Event>> {
    let mut changed = Vec::new();
    for group in &self.groups {
      let did_change = match self.modification {
        GroupsModification::Add => contact.add_group(group.clone()),
        GroupsModification::Remove => contact.remove_group(&group.uuid),
      };
      if did_change {
        changed.push(group.clone());
      }
    }

    if changed.is_empty() {
      return Vec::new();
    }

    let (groups_added, groups_removed) = match self.modification {
      GroupsModification::Add => (changed, Vec::new()),
      GroupsModification::Remove => (Vec::new(), changed),
    };
    vec![Box::new(ContactGroupsChangedEvent {
      base: base.clone(),
      groups_added,
      groups_removed,
    })]
  }
}

/// Sets or clears a contact field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldModifier {
  pub field: FieldReference,
  pub value: Option<FieldValue>,
}

typed!(FieldModifier, "field");

impl Modifier for FieldModifier {
  fn apply(&self, contact: &mut Contact, base: &EventBase) -> Vec<Box<dyn Event>> {
    if !contact.set_field(&self.field, self.value.clone()) {
      return Vec::new();
    }
    vec![Box::new(ContactFieldChangedEvent {
      base: base.clone(),
      field: self.field.clone(),
      value: self.value.clone(),
    })]
  }
}

/// Sets the contact's name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameModifier {
  pub name: String,
}

typed!(NameModifier, "name");

impl Modifier for NameModifier {
  fn apply(&self, contact: &mut Contact, base: &EventBase) -> Vec<Box<dyn Event>> {
    if contact.name == self.name {
      return Vec::new();
    }
    contact.name = self.name.clone();
    vec![Box::new(UpdateContactEvent {
      base: base.clone(),
      field_name: "name".to_string(),
      value: self.name.clone(),
    })]
  }
}

/// Sets the contact's language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageModifier {
  pub language: String,
}

typed!(LanguageModifier, "language");

impl Modifier for LanguageModifier {
  fn apply(&self, contact: &mut Contact, base: &EventBase) -> Vec<Box<dyn Event>> {
    if contact.language == self.language {
      return Vec::new();
    }
    contact.language = self.language.clone();
    vec![Box::new(UpdateContactEvent {
      base: base.clone(),
      field_name: "language".to_string(),
      value: self.language.clone(),
    })]
  }
}

pub(crate) fn register_builtins(registry: &mut Registry<dyn Modifier>) {
  registry.register("field", registry::modifier::<FieldModifier>);
  registry.register("groups", registry::modifier::<GroupsModifier>);
  registry.register("language", registry::modifier::<LanguageModifier>);
  registry.register("name", registry::modifier::<NameModifier>);
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use serde_json::json;

  use super::*;
  use crate::run::Run;

  fn base() -> EventBase {
    EventBase::new(Utc::now(), Some("s1".to_string()))
  }

  #[test]
  fn test_groups_modifier_only_reports_changes() {
    let mut contact = Contact::new("c1", "Bob");
    contact.add_group(GroupReference::new("g1", "Testers"));

    let modifier = GroupsModifier {
      groups: vec![
        GroupReference::new("g1", "Testers"),
        GroupReference::new("g2", "Males"),
      ],
      modification: GroupsModification::Add,
    };
    let events = modifier.apply(&mut contact, &base());
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].to_json()["groups_added"], json!([{"uuid": "g2", "name": "Males"}]));
    assert_eq!(contact.groups.len(), 2);

    // already applied, nothing more to report
    assert!(modifier.apply(&mut contact, &base()).is_empty());
  }

  #[test]
  fn test_events_replay_to_same_contact() {
    let mut contact = Contact::new("c1", "Bob");
    let before = contact.clone();

    let mut events = NameModifier {
      name: "Robert".to_string(),
    }
    .apply(&mut contact, &base());
    events.extend(
      LanguageModifier {
        language: "fra".to_string(),
      }
      .apply(&mut contact, &base()),
    );

    let mut replayed = before;
    let mut run = Run::new(
      "r1".to_string(),
      sluice_assets::FlowReference::new("f1", "Flow"),
      None,
      Utc::now(),
    );
    for event in &events {
      event.apply(&mut run, Some(&mut replayed));
      event.apply(&mut run, Some(&mut replayed));
    }
    assert_eq!(replayed, contact);
    assert_eq!(replayed.language, "fra");
  }
}
