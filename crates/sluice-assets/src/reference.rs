//! Lightweight references to assets, as they appear inside flow definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::asset_type::AssetType;

macro_rules! uuid_reference {
  ($name:ident, $label:literal) => {
    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct $name {
      pub uuid: String,
      #[serde(default)]
      pub name: String,
    }

    impl $name {
      pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
          uuid: uuid.into(),
          name: name.into(),
        }
      }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[uuid={},name={}]", $label, self.uuid, self.name)
      }
    }
  };
}

uuid_reference!(ChannelReference, "channel");
uuid_reference!(ClassifierReference, "classifier");
uuid_reference!(FlowReference, "flow");
uuid_reference!(GroupReference, "group");
uuid_reference!(LabelReference, "label");

/// Fields are identified by key rather than UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldReference {
  pub key: String,
  #[serde(default)]
  pub name: String,
}

impl FieldReference {
  pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      name: name.into(),
    }
  }
}

impl fmt::Display for FieldReference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "field[key={},name={}]", self.key, self.name)
  }
}

/// A reference to any kind of asset, tagged with its type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetReference {
  Channel(ChannelReference),
  Classifier(ClassifierReference),
  Field(FieldReference),
  Flow(FlowReference),
  Group(GroupReference),
  Label(LabelReference),
}

impl AssetReference {
  pub fn asset_type(&self) -> AssetType {
    match self {
      AssetReference::Channel(_) => AssetType::Channel,
      AssetReference::Classifier(_) => AssetType::Classifier,
      AssetReference::Field(_) => AssetType::Field,
      AssetReference::Flow(_) => AssetType::Flow,
      AssetReference::Group(_) => AssetType::Group,
      AssetReference::Label(_) => AssetType::Label,
    }
  }

  /// The identity the asset is looked up by: a UUID, or a key for fields.
  pub fn identity(&self) -> &str {
    match self {
      AssetReference::Channel(r) => &r.uuid,
      AssetReference::Classifier(r) => &r.uuid,
      AssetReference::Field(r) => &r.key,
      AssetReference::Flow(r) => &r.uuid,
      AssetReference::Group(r) => &r.uuid,
      AssetReference::Label(r) => &r.uuid,
    }
  }
}

impl fmt::Display for AssetReference {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AssetReference::Channel(r) => r.fmt(f),
      AssetReference::Classifier(r) => r.fmt(f),
      AssetReference::Field(r) => r.fmt(f),
      AssetReference::Flow(r) => r.fmt(f),
      AssetReference::Group(r) => r.fmt(f),
      AssetReference::Label(r) => r.fmt(f),
    }
  }
}
