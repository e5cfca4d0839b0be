//! The contact a session runs for.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sluice_assets::{ChannelUuid, FieldReference, FieldType, GroupReference, Location};
use sluice_config::RedactionPolicy;

use crate::urn::Urn;

/// A typed contact field value. `text` is always set; the other forms are
/// filled when the text parses as the field's type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
  pub text: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub number: Option<f64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub datetime: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub state: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub district: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ward: Option<String>,
}

impl FieldValue {
  /// Parse raw text for a field of the given type. Returns `None` for empty
  /// text, which clears the field.
  pub fn parse(text: &str, value_type: FieldType, locations: &[Location]) -> Option<Self> {
    let text = text.trim();
    if text.is_empty() {
      return None;
    }

    let mut value = FieldValue {
      text: text.to_string(),
      ..Default::default()
    };
    value.number = text.parse::<f64>().ok().filter(|n| n.is_finite());
    value.datetime = DateTime::parse_from_rfc3339(text)
      .ok()
      .map(|d| d.with_timezone(&Utc));

    let level = match value_type {
      FieldType::State => Some(1),
      FieldType::District => Some(2),
      FieldType::Ward => Some(3),
      _ => None,
    };
    if let Some(level) = level
      && let Some(name) = find_location(locations, text, level)
    {
      match value_type {
        FieldType::State => value.state = Some(name),
        FieldType::District => value.district = Some(name),
        _ => value.ward = Some(name),
      }
    }

    Some(value)
  }

  /// The value as the field's type would present it.
  pub fn typed(&self, value_type: FieldType) -> serde_json::Value {
    match value_type {
      FieldType::Number => self.number.map(|n| json!(n)),
      FieldType::Datetime => self.datetime.map(|d| json!(d.to_rfc3339())),
      FieldType::State => self.state.as_ref().map(|s| json!(s)),
      FieldType::District => self.district.as_ref().map(|s| json!(s)),
      FieldType::Ward => self.ward.as_ref().map(|s| json!(s)),
      FieldType::Text => None,
    }
    .unwrap_or_else(|| json!(self.text))
  }
}

/// Search the hierarchy at `level` (1 = states) for a name or alias.
fn find_location(locations: &[Location], text: &str, level: usize) -> Option<String> {
  let mut current: Vec<&Location> = locations.iter().collect();
  for _ in 0..level {
    current = current.iter().flat_map(|l| l.children.iter()).collect();
  }
  current
    .into_iter()
    .find(|l| {
      l.name.eq_ignore_ascii_case(text) || l.aliases.iter().any(|a| a.eq_ignore_ascii_case(text))
    })
    .map(|l| l.name.clone())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
  pub uuid: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub language: String,
  #[serde(default)]
  pub urns: Vec<Urn>,
  #[serde(default)]
  pub groups: Vec<GroupReference>,
  #[serde(default)]
  pub fields: BTreeMap<String, FieldValue>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_on: Option<DateTime<Utc>>,
}

impl Contact {
  pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      uuid: uuid.into(),
      name: name.into(),
      language: String::new(),
      urns: Vec::new(),
      groups: Vec::new(),
      fields: BTreeMap::new(),
      created_on: None,
    }
  }

  /// Add a URN unless one with the same identity is already present.
  /// Returns whether it was added.
  pub fn add_urn(&mut self, urn: Urn) -> bool {
    if self.urns.iter().any(|u| u.identity() == urn.identity()) {
      return false;
    }
    self.urns.push(urn);
    true
  }

  /// URNs with the given scheme, in preference order.
  pub fn urns_with_scheme<'a>(&'a self, scheme: &'a str) -> impl Iterator<Item = &'a Urn> + 'a {
    self.urns.iter().filter(move |u| u.scheme == scheme)
  }

  /// The highest priority URN.
  pub fn preferred_urn(&self) -> Option<&Urn> {
    self.urns.first()
  }

  /// Pin the URN with this identity to a channel and make it the preferred one.
  pub fn set_preferred_channel(&mut self, identity: &str, channel: &ChannelUuid) -> bool {
    let Some(index) = self.urns.iter().position(|u| u.identity() == identity) else {
      return false;
    };
    let mut urn = self.urns.remove(index);
    urn.channel = Some(channel.clone());
    self.urns.insert(0, urn);
    true
  }

  pub fn in_group(&self, uuid: &str) -> bool {
    self.groups.iter().any(|g| g.uuid == uuid)
  }

  /// Add a group membership. Returns false if the contact was already a member.
  pub fn add_group(&mut self, group: GroupReference) -> bool {
    if self.in_group(&group.uuid) {
      return false;
    }
    self.groups.push(group);
    true
  }

  /// Remove a group membership. Returns false if the contact wasn't a member.
  pub fn remove_group(&mut self, uuid: &str) -> bool {
    let before = self.groups.len();
    self.groups.retain(|g| g.uuid != uuid);
    self.groups.len() != before
  }

  pub fn field(&self, key: &str) -> Option<&FieldValue> {
    self.fields.get(key)
  }

  /// Set or clear a field. Returns whether anything changed.
  pub fn set_field(&mut self, field: &FieldReference, value: Option<FieldValue>) -> bool {
    match value {
      Some(value) => {
        if self.fields.get(&field.key) == Some(&value) {
          return false;
        }
        self.fields.insert(field.key.clone(), value);
        true
      }
      None => self.fields.remove(&field.key).is_some(),
    }
  }

  /// The contact as template expressions see it.
  pub fn to_context(&self, redaction: RedactionPolicy) -> serde_json::Value {
    let urns: Vec<String> = self
      .urns
      .iter()
      .map(|u| match redaction {
        RedactionPolicy::Urns => u.redacted(),
        RedactionPolicy::None => u.identity(),
      })
      .collect();
    let fields: serde_json::Map<String, serde_json::Value> = self
      .fields
      .iter()
      .map(|(k, v)| (k.clone(), json!(v.text)))
      .collect();

    json!({
      "uuid": self.uuid,
      "name": self.name,
      "first_name": self.name.split_whitespace().next().unwrap_or_default(),
      "language": self.language,
      "urn": urns.first(),
      "urns": urns,
      "groups": self.groups.iter().map(|g| &g.name).collect::<Vec<_>>(),
      "fields": fields,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn contact() -> Contact {
    let mut contact = Contact::new("5d76d86b-3bb9-4d5a-b822-c9d86f5d8e4f", "Ryan Lewis");
    contact.add_urn("tel:+12065551212".parse().unwrap());
    contact.add_urn("twitter:ryan".parse().unwrap());
    contact
  }

  #[test]
  fn test_groups_are_unique() {
    let mut contact = contact();
    let testers = GroupReference::new("g1", "Testers");

    assert!(contact.add_group(testers.clone()));
    assert!(!contact.add_group(testers));
    assert_eq!(contact.groups.len(), 1);

    assert!(contact.remove_group("g1"));
    assert!(!contact.remove_group("g1"));
    assert!(contact.groups.is_empty());
  }

  #[test]
  fn test_urns_are_unique_by_identity() {
    let mut contact = contact();
    assert!(!contact.add_urn("tel:+12065551212?channel=c1".parse().unwrap()));
    assert_eq!(contact.urns.len(), 2);
    assert_eq!(contact.urns_with_scheme("twitter").count(), 1);

    assert!(contact.set_preferred_channel("twitter:ryan", &"c2".to_string()));
    assert_eq!(contact.preferred_urn().unwrap().to_string(), "twitter:ryan?channel=c2");
    assert!(!contact.set_preferred_channel("tel:+1555", &"c2".to_string()));
  }

  #[test]
  fn test_field_value_parsing() {
    let locations = vec![Location {
      name: "Rwanda".to_string(),
      aliases: vec![],
      children: vec![Location {
        name: "Kigali City".to_string(),
        aliases: vec!["Kigali".to_string()],
        children: vec![],
      }],
    }];

    let value = FieldValue::parse(" 23 ", FieldType::Number, &locations).unwrap();
    assert_eq!(value.text, "23");
    assert_eq!(value.number, Some(23.0));
    assert_eq!(value.typed(FieldType::Number), json!(23.0));

    let value = FieldValue::parse("kigali", FieldType::State, &locations).unwrap();
    assert_eq!(value.state.as_deref(), Some("Kigali City"));

    let value = FieldValue::parse("2018-04-01T12:30:00Z", FieldType::Datetime, &locations).unwrap();
    assert!(value.datetime.is_some());

    assert!(FieldValue::parse("  ", FieldType::Text, &locations).is_none());
  }

  #[test]
  fn test_redacted_context() {
    let contact = contact();
    let context = contact.to_context(RedactionPolicy::Urns);
    assert_eq!(context["urns"], json!(["tel:********", "twitter:********"]));
    assert_eq!(context["first_name"], json!("Ryan"));

    let context = contact.to_context(RedactionPolicy::None);
    assert_eq!(context["urn"], json!("tel:+12065551212"));
  }
}
