use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sluice_engine::{Engine, Session};

use crate::Error;

/// A persisted session: its JSON plus the columns it's looked up by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SessionRecord {
  pub session_uuid: String,
  pub contact_uuid: Option<String>,
  pub status: String,
  pub data: String,
  pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
  pub fn from_session(session: &Session, updated_at: DateTime<Utc>) -> Result<Self, Error> {
    Ok(Self {
      session_uuid: session.uuid.clone(),
      contact_uuid: session.contact.as_ref().map(|c| c.uuid.clone()),
      status: session.status.to_string(),
      data: serde_json::to_string(&session.to_json())?,
      updated_at,
    })
  }

  /// Read the stored session back through the engine's registries.
  pub fn to_session(&self, engine: &Engine) -> Result<Session, Error> {
    Ok(engine.read_session(self.data.as_bytes())?)
  }
}
