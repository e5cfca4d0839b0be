//! Asset item types as served by an asset source.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reference::{
  ChannelReference, ClassifierReference, FieldReference, GroupReference, LabelReference,
};

pub type ChannelUuid = String;
pub type ClassifierUuid = String;
pub type GroupUuid = String;
pub type LabelUuid = String;

/// What a channel can be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelRole {
  Send,
  Receive,
  Call,
  Answer,
}

/// A channel through which messages or calls reach a contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
  pub uuid: ChannelUuid,
  pub name: String,
  pub address: String,
  pub schemes: Vec<String>,
  pub roles: Vec<ChannelRole>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub country: Option<String>,
  /// Number prefixes this channel explicitly claims, e.g. `25078`.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub match_prefixes: Vec<String>,
  /// The channel this one is a delegate for. Only an identity: the parent
  /// is looked up through the channel index when needed.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub parent: Option<ChannelReference>,
}

impl Channel {
  pub fn has_role(&self, role: ChannelRole) -> bool {
    self.roles.contains(&role)
  }

  pub fn supports_scheme(&self, scheme: &str) -> bool {
    self.schemes.iter().any(|s| s == scheme)
  }

  pub fn reference(&self) -> ChannelReference {
    ChannelReference::new(&self.uuid, &self.name)
  }
}

impl fmt::Display for Channel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.address, self.name)
  }
}

/// An NLU classifier that can be called to extract intents and entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classifier {
  pub uuid: ClassifierUuid,
  pub name: String,
  /// Service kind, used to look up the service implementation.
  #[serde(rename = "type")]
  pub kind: String,
  #[serde(default)]
  pub intents: Vec<String>,
}

impl Classifier {
  pub fn reference(&self) -> ClassifierReference {
    ClassifierReference::new(&self.uuid, &self.name)
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
  #[default]
  Text,
  Number,
  Datetime,
  State,
  District,
  Ward,
}

/// A custom contact field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
  pub key: String,
  pub name: String,
  #[serde(default)]
  pub value_type: FieldType,
}

impl Field {
  pub fn reference(&self) -> FieldReference {
    FieldReference::new(&self.key, &self.name)
  }
}

/// A contact group. Groups with a query are dynamic and can't be
/// added to or removed from explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
  pub uuid: GroupUuid,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub query: Option<String>,
}

impl Group {
  pub fn is_dynamic(&self) -> bool {
    self.query.is_some()
  }

  pub fn reference(&self) -> GroupReference {
    GroupReference::new(&self.uuid, &self.name)
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
  pub uuid: LabelUuid,
  pub name: String,
}

impl Label {
  pub fn reference(&self) -> LabelReference {
    LabelReference::new(&self.uuid, &self.name)
  }
}

/// A node in a location hierarchy (country → state → district → ward).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
  pub name: String,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub aliases: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub children: Vec<Location>,
}

/// A named hook that external systems subscribe to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resthook {
  pub slug: String,
  #[serde(default)]
  pub subscribers: Vec<String>,
}
