//! Session environment: the locale, timezone and privacy settings a session
//! executes under.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Which contact data is hidden from templates and logs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactionPolicy {
  #[default]
  None,
  /// URN paths are replaced with asterisks.
  Urns,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
  #[serde(default = "default_date_format")]
  pub date_format: String,
  #[serde(default = "default_time_format")]
  pub time_format: String,
  #[serde(default = "default_timezone")]
  pub timezone: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_language: Option<String>,
  #[serde(default)]
  pub allowed_languages: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_country: Option<String>,
  #[serde(default)]
  pub redaction_policy: RedactionPolicy,
  /// Per-extension configuration blobs, e.g. credentials for a service.
  #[serde(default, skip_serializing_if = "HashMap::is_empty")]
  pub extensions: HashMap<String, serde_json::Value>,
}

impl Environment {
  /// Get the configuration blob for the named extension.
  pub fn extension(&self, name: &str) -> Option<&serde_json::Value> {
    self.extensions.get(name)
  }
}

impl Default for Environment {
  fn default() -> Self {
    Self {
      date_format: default_date_format(),
      time_format: default_time_format(),
      timezone: default_timezone(),
      default_language: None,
      allowed_languages: Vec::new(),
      default_country: None,
      redaction_policy: RedactionPolicy::None,
      extensions: HashMap::new(),
    }
  }
}

fn default_date_format() -> String {
  "YYYY-MM-DD".to_string()
}

fn default_time_format() -> String {
  "tt:mm".to_string()
}

fn default_timezone() -> String {
  "UTC".to_string()
}
