use std::collections::HashMap;

use sluice_engine::SessionStatus;
use tokio::sync::RwLock;

use crate::{Error, SessionRecord, Store};

/// In-memory store, for tests and single-process embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
  sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  async fn filtered(&self, keep: impl Fn(&SessionRecord) -> bool) -> Vec<SessionRecord> {
    let sessions = self.sessions.read().await;
    let mut records: Vec<SessionRecord> = sessions.values().filter(|r| keep(r)).cloned().collect();
    records.sort_by(|a, b| {
      a.updated_at
        .cmp(&b.updated_at)
        .then_with(|| a.session_uuid.cmp(&b.session_uuid))
    });
    records
  }
}

impl Store for MemoryStore {
  type Error = Error;

  async fn save_session(&self, record: &SessionRecord) -> Result<(), Self::Error> {
    self
      .sessions
      .write()
      .await
      .insert(record.session_uuid.clone(), record.clone());
    Ok(())
  }

  async fn get_session(&self, session_uuid: &str) -> Result<SessionRecord, Self::Error> {
    self
      .sessions
      .read()
      .await
      .get(session_uuid)
      .cloned()
      .ok_or_else(|| Error::NotFound(session_uuid.to_string()))
  }

  async fn list_sessions(&self, status: SessionStatus) -> Result<Vec<SessionRecord>, Self::Error> {
    let status = status.to_string();
    Ok(self.filtered(|r| r.status == status).await)
  }

  async fn list_contact_sessions(
    &self,
    contact_uuid: &str,
  ) -> Result<Vec<SessionRecord>, Self::Error> {
    Ok(
      self
        .filtered(|r| r.contact_uuid.as_deref() == Some(contact_uuid))
        .await,
    )
  }

  async fn delete_session(&self, session_uuid: &str) -> Result<(), Self::Error> {
    self.sessions.write().await.remove(session_uuid);
    Ok(())
  }
}
