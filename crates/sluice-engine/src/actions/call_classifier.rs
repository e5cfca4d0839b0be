use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sluice_assets::{AssetError, AssetReference, AssetType, ClassifierReference};
use tracing::debug;

use super::Action;
use crate::assets::SessionAssets;
use crate::context::ActionContext;
use crate::error::ActionError;
use crate::events::ClassifierCalledEvent;
use crate::results::{CATEGORY_FAILURE, CATEGORY_SKIPPED, CATEGORY_SUCCESS, ResultInfo};
use crate::services::{Classification, HttpLogger};
use crate::typed;

const CLASSIFICATION_CATEGORIES: &[&str] = &[CATEGORY_SUCCESS, CATEGORY_SKIPPED, CATEGORY_FAILURE];

/// Classifies the evaluated input with an NLU classifier and saves the top
/// intent as a result. The whole classification is kept as the result's
/// extra data.
///
/// ```json
/// {
///   "uuid": "2f2b9f8e-27b3-4a9b-85a4-5d5c0fd6a1d5",
///   "type": "call_classifier",
///   "classifier": {"uuid": "1c06c884-39dd-4ce4-ad9f-9a01cbe6c000", "name": "Booking"},
///   "input": "{{ input.text }}",
///   "result_name": "Intent"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallClassifierAction {
  pub uuid: String,
  pub classifier: ClassifierReference,
  pub input: String,
  pub result_name: String,
}

typed!(CallClassifierAction, "call_classifier");

enum Outcome {
  Skipped,
  Failed,
  Classified(Classification),
}

impl CallClassifierAction {
  async fn classify(&self, ctx: &mut ActionContext<'_>, input: &str) -> Outcome {
    if input.is_empty() {
      ctx.log_error("can't classify empty input, skipping classification");
      return Outcome::Skipped;
    }

    let Some(classifier) = ctx.assets().classifier(&self.classifier.uuid).cloned() else {
      ctx.log_error(format!("missing dependency: {}", self.classifier));
      return Outcome::Failed;
    };

    let service = match ctx.services().classification(ctx.environment(), &classifier) {
      Ok(service) => service,
      Err(err) => {
        ctx.log_error(err.to_string());
        return Outcome::Failed;
      }
    };

    let mut logger = HttpLogger::new();
    let result = service.classify(ctx.environment(), input, &mut logger).await;
    debug!(classifier = %classifier.uuid, ok = result.is_ok(), "classifier called");

    if !logger.is_empty() {
      let event = ClassifierCalledEvent {
        base: ctx.event_base(),
        classifier: classifier.reference(),
        http_logs: logger.into_logs(),
      };
      ctx.log_event(Box::new(event));
    }

    match result {
      Ok(classification) => Outcome::Classified(classification),
      Err(err) => {
        ctx.log_error(err.to_string());
        Outcome::Failed
      }
    }
  }
}

#[async_trait]
impl Action for CallClassifierAction {
  fn uuid(&self) -> &str {
    &self.uuid
  }

  fn validate(&self, assets: &SessionAssets) -> Result<(), ActionError> {
    assets.classifier(&self.classifier.uuid).ok_or_else(|| AssetError::ItemNotFound {
      asset_type: AssetType::Classifier,
      uuid: self.classifier.uuid.clone(),
    })?;
    Ok(())
  }

  async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
    let input = ctx.evaluate(&self.input).trim().to_string();

    match self.classify(ctx, &input).await {
      Outcome::Skipped => {
        ctx.save_result(&self.result_name, "0", Some(CATEGORY_SKIPPED), Some(&input), None);
      }
      Outcome::Failed => {
        ctx.save_result(&self.result_name, "0", Some(CATEGORY_FAILURE), Some(&input), None);
      }
      Outcome::Classified(classification) => {
        let value = classification
          .intents
          .first()
          .map(|intent| intent.name.clone())
          .unwrap_or_default();
        let extra = serde_json::to_value(&classification).ok();
        ctx.save_result(&self.result_name, &value, Some(CATEGORY_SUCCESS), Some(&input), extra);
      }
    }
    Ok(())
  }

  fn results(&self, node_uuid: &str, include: &mut dyn FnMut(ResultInfo)) {
    if !self.result_name.is_empty() {
      include(ResultInfo::new(&self.result_name, CLASSIFICATION_CATEGORIES, node_uuid));
    }
  }

  fn references(&self) -> Vec<AssetReference> {
    vec![AssetReference::Classifier(self.classifier.clone())]
  }
}
