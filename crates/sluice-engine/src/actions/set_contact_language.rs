use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::Action;
use crate::context::ActionContext;
use crate::error::ActionError;
use crate::modifiers::LanguageModifier;
use crate::typed;

/// Sets the contact's language. The evaluated value must be a three letter
/// code, or empty to clear it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetContactLanguageAction {
  pub uuid: String,
  pub language: String,
}

typed!(SetContactLanguageAction, "set_contact_language");

fn is_language_code(code: &str) -> bool {
  code.len() == 3 && code.chars().all(|c| c.is_ascii_lowercase())
}

#[async_trait]
impl Action for SetContactLanguageAction {
  fn uuid(&self) -> &str {
    &self.uuid
  }

  async fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<(), ActionError> {
    ctx.require_contact()?;

    let language = ctx.evaluate(&self.language).trim().to_lowercase();
    if !language.is_empty() && !is_language_code(&language) {
      ctx.log_error(format!("'{}' isn't a valid language code", language));
      return Ok(());
    }
    ctx.apply_modifier(Box::new(LanguageModifier { language }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn language_codes() {
    assert!(is_language_code("eng"));
    assert!(is_language_code("kin"));
    assert!(!is_language_code("en"));
    assert!(!is_language_code("english"));
    assert!(!is_language_code("e1g"));
  }
}
