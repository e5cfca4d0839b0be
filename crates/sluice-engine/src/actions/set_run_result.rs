use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Action;
use crate::context::ActionContext;
use crate::error::ActionError;
use crate::results::ResultInfo;
use crate::typed;

/// Saves a result on the run.
///
/// ```json
/// {
///   "uuid": "0c4c2a4b-4e0d-4a49-9b29-0a42b6bb2a56",
///   "type": "set_run_result",
///   "name": "Gender",
///   "value": "m",
///   "category": "Male"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRunResultAction {
  pub uuid: String,
  pub name: String,
  #[serde(default)]
  pub value: String,
  #[serde(default)]
  pub category: String,
}

typed!(SetRunResultAction, "set_run_result");

#[async_trait]
impl Action for SetRunResultAction {
  fn uuid(&self) -> &str {
    &self.uuid
  }

  async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
    let value = ctx.evaluate(&self.value);
    let category = (!self.category.is_empty()).then_some(self.category.as_str());
    ctx.save_result(&self.name, &value, category, None, None);
    Ok(())
  }

  fn results(&self, node_uuid: &str, include: &mut dyn FnMut(ResultInfo)) {
    let categories: Vec<&str> = if self.category.is_empty() {
      Vec::new()
    } else {
      vec![self.category.as_str()]
    };
    include(ResultInfo::new(&self.name, &categories, node_uuid));
  }
}
