use sluice_engine::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no such session with uuid '{0}'")]
  NotFound(String),

  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("unable to serialize session: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("unable to read stored session: {0}")]
  Decode(#[from] DecodeError),
}
