//! Type-tag keyed registries.
//!
//! Actions, events, modifiers, triggers, resumes and waits are all open
//! families: each variant is a concrete type registered under its `type` tag,
//! and values are decoded by reading the tag first, then handing the whole
//! object to the registered constructor.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::actions::{self, Action};
use crate::error::DecodeError;
use crate::events::{self, Event};
use crate::modifiers::{self, Modifier};
use crate::resumes::{self, Resume};
use crate::triggers::{self, Trigger};
use crate::waits::{self, Wait};

/// Something identified by a type tag that can write itself back out.
pub trait Typed {
  fn type_name(&self) -> &'static str;

  /// The value as JSON, including its `type` tag.
  fn to_json(&self) -> serde_json::Value;
}

/// Serialize `value` with a `type` field set to `tag`.
pub fn tagged_json<T: Serialize>(tag: &'static str, value: &T) -> serde_json::Value {
  let mut json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
  match json {
    serde_json::Value::Object(ref mut map) => {
      map.insert("type".to_string(), serde_json::Value::from(tag));
    }
    _ => {
      json = serde_json::json!({ "type": tag });
    }
  }
  json
}

/// Implement [`Typed`] for a serializable type under the given tag.
#[macro_export]
macro_rules! typed {
  ($ty:ty, $tag:expr) => {
    impl $crate::Typed for $ty {
      fn type_name(&self) -> &'static str {
        $tag
      }

      fn to_json(&self) -> ::serde_json::Value {
        $crate::tagged_json($tag, self)
      }
    }
  };
}

/// Decodes the full tagged object into a boxed variant.
pub type Constructor<T> = fn(serde_json::Value) -> Result<Box<T>, serde_json::Error>;

/// Constructors for one family, keyed by type tag.
pub struct Registry<T: ?Sized> {
  family: &'static str,
  constructors: HashMap<String, Constructor<T>>,
}

impl<T: ?Sized> Registry<T> {
  pub fn new(family: &'static str) -> Self {
    Self {
      family,
      constructors: HashMap::new(),
    }
  }

  /// Register a constructor, replacing any existing one for the tag.
  pub fn register(&mut self, tag: impl Into<String>, constructor: Constructor<T>) {
    self.constructors.insert(tag.into(), constructor);
  }

  pub fn contains(&self, tag: &str) -> bool {
    self.constructors.contains_key(tag)
  }

  /// Registered tags, sorted.
  pub fn tags(&self) -> Vec<&str> {
    let mut tags: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
    tags.sort_unstable();
    tags
  }

  pub fn decode(&self, value: serde_json::Value) -> Result<Box<T>, DecodeError> {
    let tag = value
      .get("type")
      .and_then(|t| t.as_str())
      .ok_or(DecodeError::MissingType)?
      .to_string();

    let constructor = self
      .constructors
      .get(&tag)
      .ok_or_else(|| DecodeError::UnknownType(tag.clone()))?;

    constructor(value).map_err(|source| DecodeError::Invalid {
      family: self.family,
      tag,
      source,
    })
  }

  pub fn decode_slice(&self, data: &[u8]) -> Result<Box<T>, DecodeError> {
    self.decode(serde_json::from_slice(data)?)
  }
}

impl<T: ?Sized> fmt::Debug for Registry<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Registry")
      .field("family", &self.family)
      .field("tags", &self.tags())
      .finish()
  }
}

macro_rules! constructor_fn {
  ($name:ident, $trait:ident) => {
    /// Constructor for any deserializable implementation of the family.
    pub fn $name<V: $trait + DeserializeOwned + 'static>(
      value: serde_json::Value,
    ) -> Result<Box<dyn $trait>, serde_json::Error> {
      Ok(Box::new(serde_json::from_value::<V>(value)?))
    }
  };
}

constructor_fn!(action, Action);
constructor_fn!(event, Event);
constructor_fn!(modifier, Modifier);
constructor_fn!(trigger, Trigger);
constructor_fn!(resume, Resume);
constructor_fn!(wait, Wait);

/// One registry per family.
#[derive(Debug)]
pub struct Registries {
  pub actions: Registry<dyn Action>,
  pub events: Registry<dyn Event>,
  pub modifiers: Registry<dyn Modifier>,
  pub triggers: Registry<dyn Trigger>,
  pub resumes: Registry<dyn Resume>,
  pub waits: Registry<dyn Wait>,
}

impl Registries {
  /// Empty registries.
  pub fn empty() -> Self {
    Self {
      actions: Registry::new("action"),
      events: Registry::new("event"),
      modifiers: Registry::new("modifier"),
      triggers: Registry::new("trigger"),
      resumes: Registry::new("resume"),
      waits: Registry::new("wait"),
    }
  }
}

impl Default for Registries {
  /// Registries with every built-in type registered.
  fn default() -> Self {
    let mut registries = Self::empty();
    actions::register_builtins(&mut registries.actions);
    events::register_builtins(&mut registries.events);
    modifiers::register_builtins(&mut registries.modifiers);
    triggers::register_builtins(&mut registries.triggers);
    resumes::register_builtins(&mut registries.resumes);
    waits::register_builtins(&mut registries.waits);
    registries
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn test_decode_known_and_unknown_tags() {
    let registries = Registries::default();

    let action = registries
      .actions
      .decode(json!({
        "type": "set_contact_name",
        "uuid": "ad154980-7bf7-4ab8-8728-545fd6378912",
        "name": "Bob"
      }))
      .unwrap();
    assert_eq!(action.type_name(), "set_contact_name");
    assert_eq!(action.uuid(), "ad154980-7bf7-4ab8-8728-545fd6378912");

    let err = registries
      .actions
      .decode(json!({"type": "do_the_thing", "uuid": "a1"}))
      .unwrap_err();
    assert_eq!(err.to_string(), "unknown type: 'do_the_thing'");

    assert!(matches!(
      registries.events.decode(json!({"text": "oops"})),
      Err(DecodeError::MissingType)
    ));
    assert!(matches!(
      registries.actions.decode(json!({"type": "set_contact_name"})),
      Err(DecodeError::Invalid { family: "action", .. })
    ));
  }

  #[test]
  fn test_builtin_tags() {
    let registries = Registries::default();
    assert_eq!(
      registries.actions.tags(),
      vec![
        "add_to_group",
        "call_classifier",
        "enter_flow",
        "remove_from_group",
        "send_msg",
        "set_contact_field",
        "set_contact_language",
        "set_contact_name",
        "set_run_result",
      ]
    );
    assert_eq!(registries.waits.tags(), vec!["dial", "msg", "nothing"]);
    assert_eq!(registries.resumes.tags(), vec!["dial", "msg", "run_expiration"]);
    assert_eq!(
      registries.triggers.tags(),
      vec!["campaign", "flow_action", "manual", "msg"]
    );
    assert_eq!(
      registries.modifiers.tags(),
      vec!["field", "groups", "language", "name"]
    );
    assert_eq!(registries.events.tags().len(), 14);
  }

  #[test]
  fn test_tagged_json_round_trip() {
    let registries = Registries::default();
    let wait = registries
      .waits
      .decode(json!({"type": "msg", "timeout_seconds": 300}))
      .unwrap();
    assert_eq!(wait.to_json(), json!({"type": "msg", "timeout_seconds": 300}));
  }
}
