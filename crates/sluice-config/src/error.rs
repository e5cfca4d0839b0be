use thiserror::Error;

#[derive(Debug, Error)]
pub enum DefinitionError {
  #[error("unable to read flow definition: {0}")]
  Json(#[from] serde_json::Error),

  #[error("field '{field}' is required")]
  MissingField { field: &'static str },
}
