//! Runs and the steps they take through a flow.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sluice_assets::FlowReference;

use crate::input::Input;
use crate::results::{RunResult, result_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  Active,
  Waiting,
  Completed,
  Exited,
  Expired,
  Errored,
}

impl RunStatus {
  /// Whether the run can no longer make progress.
  pub fn is_terminal(self) -> bool {
    !matches!(self, RunStatus::Active | RunStatus::Waiting)
  }
}

impl fmt::Display for RunStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      RunStatus::Active => "active",
      RunStatus::Waiting => "waiting",
      RunStatus::Completed => "completed",
      RunStatus::Exited => "exited",
      RunStatus::Expired => "expired",
      RunStatus::Errored => "errored",
    };
    f.write_str(s)
  }
}

/// A visit to a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
  pub uuid: String,
  pub node_uuid: String,
  /// The exit taken, set when the run leaves the node.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub exit_uuid: Option<String>,
  pub arrived_on: DateTime<Utc>,
}

/// One execution of one flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
  pub uuid: String,
  pub flow: FlowReference,
  #[serde(default)]
  pub path: Vec<Step>,
  #[serde(default)]
  pub results: BTreeMap<String, RunResult>,
  pub status: RunStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub parent_uuid: Option<String>,
  /// The child run this run is waiting on to finish.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub child_uuid: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub input: Option<Input>,
  pub created_on: DateTime<Utc>,
  pub modified_on: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub expires_on: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub exited_on: Option<DateTime<Utc>>,
}

impl Run {
  pub fn new(
    uuid: String,
    flow: FlowReference,
    parent_uuid: Option<String>,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      uuid,
      flow,
      path: Vec::new(),
      results: BTreeMap::new(),
      status: RunStatus::Active,
      parent_uuid,
      child_uuid: None,
      input: None,
      created_on: now,
      modified_on: now,
      expires_on: None,
      exited_on: None,
    }
  }

  /// Record arrival at a node.
  pub fn create_step(&mut self, uuid: String, node_uuid: &str, now: DateTime<Utc>) -> &Step {
    self.path.push(Step {
      uuid,
      node_uuid: node_uuid.to_string(),
      exit_uuid: None,
      arrived_on: now,
    });
    self.modified_on = now;
    &self.path[self.path.len() - 1]
  }

  pub fn last_step(&self) -> Option<&Step> {
    self.path.last()
  }

  /// Record the exit taken from the current node.
  pub fn leave_step(&mut self, exit_uuid: &str) {
    if let Some(step) = self.path.last_mut() {
      step.exit_uuid = Some(exit_uuid.to_string());
    }
  }

  /// Save a result, replacing any with the same key.
  pub fn save_result(&mut self, result: RunResult) {
    self.modified_on = result.created_on;
    self.results.insert(result_key(&result.name), result);
  }

  pub fn result(&self, name: &str) -> Option<&RunResult> {
    self.results.get(&result_key(name))
  }

  pub fn set_status(&mut self, status: RunStatus, now: DateTime<Utc>) {
    self.status = status;
    self.modified_on = now;
    if status.is_terminal() {
      self.exited_on = Some(now);
      self.expires_on = None;
    }
  }

  /// Results as template expressions see them, keyed by result key.
  pub fn results_context(&self) -> serde_json::Value {
    let results: serde_json::Map<String, serde_json::Value> = self
      .results
      .iter()
      .map(|(key, r)| {
        (
          key.clone(),
          json!({
            "name": r.name,
            "value": r.value,
            "category": r.category,
            "input": r.input,
            "extra": r.extra,
          }),
        )
      })
      .collect();
    serde_json::Value::Object(results)
  }

  /// The run as seen from a related run's templates.
  pub fn summary_context(&self) -> serde_json::Value {
    json!({
      "uuid": self.uuid,
      "flow": {"uuid": self.flow.uuid, "name": self.flow.name},
      "status": self.status.to_string(),
      "results": self.results_context(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2018-10-18T14:20:30Z")
      .unwrap()
      .with_timezone(&Utc)
  }

  #[test]
  fn test_steps_and_results() {
    let mut run = Run::new(
      "r1".to_string(),
      FlowReference::new("f1", "Registration"),
      None,
      now(),
    );

    run.create_step("s1".to_string(), "n1", now());
    run.leave_step("e1");
    assert_eq!(run.last_step().unwrap().exit_uuid.as_deref(), Some("e1"));

    run.save_result(RunResult {
      name: "Favorite Color".to_string(),
      value: "red".to_string(),
      category: Some("Red".to_string()),
      input: None,
      extra: None,
      node_uuid: "n1".to_string(),
      created_on: now(),
    });
    assert_eq!(run.result("favorite color").unwrap().value, "red");
    assert_eq!(
      run.results_context()["favorite_color"]["category"],
      json!("Red")
    );

    run.set_status(RunStatus::Completed, now());
    assert!(run.status.is_terminal());
    assert_eq!(run.exited_on, Some(now()));
  }
}
