use sluice_assets::AssetError;
use sluice_config::DefinitionError;
use thiserror::Error;

use crate::session::SessionStatus;

/// Errors decoding a type-tagged value through a registry.
#[derive(Debug, Error)]
pub enum DecodeError {
  /// No constructor is registered for the tag.
  #[error("unknown type: '{0}'")]
  UnknownType(String),

  /// The value has no `type` field.
  #[error("field 'type' is required")]
  MissingType,

  /// The tag is known but the remaining fields don't fit it.
  #[error("unable to read {family}[type={tag}]: {source}")]
  Invalid {
    family: &'static str,
    tag: String,
    #[source]
    source: serde_json::Error,
  },

  /// The input isn't valid JSON at all.
  #[error("unable to read JSON: {0}")]
  Json(#[from] serde_json::Error),
}

/// Structural problems with a flow definition, found when it is read.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error(transparent)]
  Definition(#[from] DefinitionError),

  #[error("flow has no nodes")]
  NoNodes,

  #[error("node uuid {0} isn't unique")]
  DuplicateNode(String),

  #[error("exit uuid {0} isn't unique")]
  DuplicateExit(String),

  #[error("destination {destination} of exit[uuid={exit_uuid}] isn't a known node")]
  UnknownDestination { exit_uuid: String, destination: String },

  #[error("category[uuid={category_uuid}] on node[uuid={node_uuid}] has exit {exit_uuid} which isn't a known exit")]
  UnknownCategoryExit {
    node_uuid: String,
    category_uuid: String,
    exit_uuid: String,
  },

  #[error("case[uuid={case_uuid}] on node[uuid={node_uuid}] has category {category_uuid} which isn't a known category")]
  UnknownCaseCategory {
    node_uuid: String,
    case_uuid: String,
    category_uuid: String,
  },

  #[error("router on node[uuid={node_uuid}] has default category {category_uuid} which isn't a known category")]
  UnknownDefaultCategory {
    node_uuid: String,
    category_uuid: String,
  },

  #[error("case[uuid={case_uuid}] on node[uuid={node_uuid}] has unknown test '{test}'")]
  UnknownTest {
    node_uuid: String,
    case_uuid: String,
    test: String,
  },

  #[error("nodes [{}] form a cycle with no waits", .node_uuids.join(", "))]
  Cycle { node_uuids: Vec<String> },

  #[error("unable to read action on node[uuid={node_uuid}]: {source}")]
  Action {
    node_uuid: String,
    #[source]
    source: DecodeError,
  },

  #[error("unable to read wait on node[uuid={node_uuid}]: {source}")]
  Wait {
    node_uuid: String,
    #[source]
    source: DecodeError,
  },
}

/// A flow that is structurally sound but can't run against the current assets.
#[derive(Debug, Error)]
pub enum ValidationError {
  #[error("validation failed for flow[uuid={flow_uuid}]: {source}")]
  Flow {
    flow_uuid: String,
    #[source]
    source: Box<ValidationError>,
  },

  #[error("validation failed for action[uuid={uuid}, type={action_type}]: {source}")]
  Action {
    uuid: String,
    action_type: &'static str,
    #[source]
    source: ActionError,
  },
}

/// Failures inside a single action.
#[derive(Debug, Error)]
pub enum ActionError {
  /// The action needs a contact and the session has none. Fatal to the run.
  #[error("can't execute action in session without a contact")]
  NoContact,

  #[error(transparent)]
  Asset(#[from] AssetError),

  #[error(transparent)]
  Service(#[from] ServiceError),

  #[error("{0}")]
  Invalid(String),
}

impl ActionError {
  pub fn is_fatal(&self) -> bool {
    matches!(self, ActionError::NoContact)
  }
}

/// Failures calling an external service.
#[derive(Debug, Error)]
pub enum ServiceError {
  #[error("no {service} service available for {kind}")]
  Unavailable { service: &'static str, kind: String },

  #[error("{0}")]
  Failed(String),
}

/// Error returned by `Engine::start` and `Engine::resume`. Nothing has been
/// applied to the session when one of these is returned.
#[derive(Debug, Error)]
pub enum EngineError {
  #[error("session has already been started")]
  AlreadyStarted,

  #[error("only waiting sessions can be resumed, session status is '{0}'")]
  NotWaiting(SessionStatus),

  #[error("session has no waiting run")]
  NoWaitingRun,

  #[error("resume of type {resume_type} not accepted by wait of type {wait_type}")]
  ResumeRejected {
    resume_type: &'static str,
    wait_type: &'static str,
  },

  #[error(transparent)]
  Asset(#[from] AssetError),

  #[error("unable to read flow[uuid={flow_uuid}]: {source}")]
  Flow {
    flow_uuid: String,
    #[source]
    source: FlowError,
  },

  #[error("{}", join_messages(.0))]
  Validation(Vec<ValidationError>),

  #[error(transparent)]
  Decode(#[from] DecodeError),
}

fn join_messages(errors: &[ValidationError]) -> String {
  errors
    .iter()
    .map(|e| e.to_string())
    .collect::<Vec<_>>()
    .join("; ")
}

impl EngineError {
  /// The HTTP status a front-end should answer with: 500 for failures to
  /// reach assets, 400 for everything the caller sent.
  pub fn status_code(&self) -> u16 {
    match self {
      EngineError::Asset(AssetError::Transport(_))
      | EngineError::Asset(AssetError::Status { .. })
      | EngineError::Asset(AssetError::NotJson { .. })
      | EngineError::Asset(AssetError::WrongType { .. }) => 500,
      _ => 400,
    }
  }

  /// The error as a flat list of human readable messages.
  pub fn messages(&self) -> Vec<String> {
    match self {
      EngineError::Validation(errors) => errors.iter().map(|e| e.to_string()).collect(),
      other => vec![other.to_string()],
    }
  }
}

/// A URN string that couldn't be parsed.
#[derive(Debug, Error)]
#[error("invalid URN '{0}'")]
pub struct UrnError(pub String);

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_validation_messages() {
    let err = ValidationError::Flow {
      flow_uuid: "f1".to_string(),
      source: Box::new(ValidationError::Action {
        uuid: "a1".to_string(),
        action_type: "add_to_group",
        source: ActionError::Asset(AssetError::ItemNotFound {
          asset_type: sluice_assets::AssetType::Group,
          uuid: "g1".to_string(),
        }),
      }),
    };
    assert_eq!(
      err.to_string(),
      "validation failed for flow[uuid=f1]: validation failed for action[uuid=a1, type=add_to_group]: no such group with uuid 'g1'"
    );

    let engine_err = EngineError::Validation(vec![err]);
    assert_eq!(engine_err.status_code(), 400);
    assert_eq!(engine_err.messages().len(), 1);
  }

  #[test]
  fn test_status_codes() {
    let err = EngineError::Asset(AssetError::Status {
      url: "http://assets/group/".to_string(),
      status: 503,
    });
    assert_eq!(err.status_code(), 500);
    assert_eq!(
      err.messages(),
      vec!["request to http://assets/group/ returned non-200 response (503)".to_string()]
    );
    assert_eq!(EngineError::AlreadyStarted.status_code(), 400);
  }
}
