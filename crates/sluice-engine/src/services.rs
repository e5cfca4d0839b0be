//! External services actions can call, and the traces those calls leave.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sluice_assets::Classifier;
use sluice_config::Environment;

use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
  Success,
  ResponseError,
  ConnectionError,
}

/// Trace of one HTTP call made by a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpLog {
  pub url: String,
  pub status: CallStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub status_code: Option<u16>,
  pub request: String,
  #[serde(default)]
  pub response: String,
  pub created_on: DateTime<Utc>,
  pub elapsed_ms: u64,
}

/// Collects the HTTP traces of calls made during one action.
#[derive(Debug, Default)]
pub struct HttpLogger {
  logs: Vec<HttpLog>,
}

impl HttpLogger {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn log(&mut self, log: HttpLog) {
    self.logs.push(log);
  }

  pub fn is_empty(&self) -> bool {
    self.logs.is_empty()
  }

  pub fn into_logs(self) -> Vec<HttpLog> {
    self.logs
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedIntent {
  pub name: String,
  pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
  pub value: String,
  pub confidence: f64,
}

/// What a classifier made of an input. Intents are ordered by confidence,
/// highest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
  #[serde(default)]
  pub intents: Vec<ExtractedIntent>,
  #[serde(default)]
  pub entities: BTreeMap<String, Vec<ExtractedEntity>>,
}

/// An NLU provider.
#[async_trait]
pub trait ClassificationService: Send + Sync {
  async fn classify(
    &self,
    environment: &Environment,
    input: &str,
    logger: &mut HttpLogger,
  ) -> Result<Classification, ServiceError>;
}

/// Builds the classification service for a classifier, or `None` if its
/// kind isn't supported.
pub type ClassificationFactory =
  Arc<dyn Fn(&Environment, &Classifier) -> Option<Arc<dyn ClassificationService>> + Send + Sync>;

/// Service factories configured on the engine.
#[derive(Clone, Default)]
pub struct Services {
  classification: Option<ClassificationFactory>,
}

impl Services {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_classification<F>(mut self, factory: F) -> Self
  where
    F: Fn(&Environment, &Classifier) -> Option<Arc<dyn ClassificationService>> + Send + Sync + 'static,
  {
    self.classification = Some(Arc::new(factory));
    self
  }

  pub fn classification(
    &self,
    environment: &Environment,
    classifier: &Classifier,
  ) -> Result<Arc<dyn ClassificationService>, ServiceError> {
    self
      .classification
      .as_ref()
      .and_then(|factory| factory(environment, classifier))
      .ok_or_else(|| ServiceError::Unavailable {
        service: "classification",
        kind: format!("classifier of type '{}'", classifier.kind),
      })
  }
}

impl fmt::Debug for Services {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Services")
      .field("classification", &self.classification.is_some())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Echo;

  #[async_trait]
  impl ClassificationService for Echo {
    async fn classify(
      &self,
      _environment: &Environment,
      input: &str,
      _logger: &mut HttpLogger,
    ) -> Result<Classification, ServiceError> {
      Ok(Classification {
        intents: vec![ExtractedIntent {
          name: input.to_string(),
          confidence: 1.0,
        }],
        entities: BTreeMap::new(),
      })
    }
  }

  fn classifier(kind: &str) -> Classifier {
    Classifier {
      uuid: "1c06c884-39dd-4ce4-ad9f-9a01cbe6c000".to_string(),
      name: "Booking".to_string(),
      kind: kind.to_string(),
      intents: vec!["book_flight".to_string()],
    }
  }

  #[tokio::test]
  async fn test_classification_lookup() {
    let services = Services::new().with_classification(|_, c| {
      (c.kind == "echo").then(|| Arc::new(Echo) as Arc<dyn ClassificationService>)
    });
    let env = Environment::default();

    let svc = services.classification(&env, &classifier("echo")).unwrap();
    let mut logger = HttpLogger::new();
    let result = svc.classify(&env, "book_flight", &mut logger).await.unwrap();
    assert_eq!(result.intents[0].name, "book_flight");

    let err = services.classification(&env, &classifier("wit")).err().unwrap();
    assert_eq!(
      err.to_string(),
      "no classification service available for classifier of type 'wit'"
    );
  }
}
