//! Template evaluation for action parameters.
//!
//! Evaluation never fails outright: errors are returned alongside the best
//! output that could be produced, and the engine logs them as error events.

use minijinja::{Environment, UndefinedBehavior, Value};

/// Evaluates templated strings against a JSON context.
pub trait TemplateEvaluator: Send + Sync {
  fn evaluate(&self, template: &str, context: &serde_json::Value) -> (String, Vec<String>);
}

/// Whether a string contains anything an evaluator would substitute.
pub fn is_template(s: &str) -> bool {
  s.contains("{{") || s.contains("{%")
}

/// Default evaluator using minijinja syntax, e.g. `Hi {{ contact.first_name }}`.
///
/// Undefined values render as empty strings. On a syntax or render error the
/// template is returned unchanged along with the error.
pub struct MiniJinjaEvaluator {
  env: Environment<'static>,
}

impl MiniJinjaEvaluator {
  pub fn new() -> Self {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Chainable);
    Self { env }
  }
}

impl Default for MiniJinjaEvaluator {
  fn default() -> Self {
    Self::new()
  }
}

impl TemplateEvaluator for MiniJinjaEvaluator {
  fn evaluate(&self, template: &str, context: &serde_json::Value) -> (String, Vec<String>) {
    if !is_template(template) {
      return (template.to_string(), Vec::new());
    }

    match self
      .env
      .render_str(template, Value::from_serialize(context))
    {
      Ok(rendered) => (rendered, Vec::new()),
      Err(e) => (template.to_string(), vec![format!("error evaluating template: {}", e)]),
    }
  }
}
