use sluice_engine::SessionStatus;
use sqlx::SqlitePool;
use tracing::debug;

use crate::{Error, SessionRecord, Store};

/// SQLite-based store implementation.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(&self.pool).await
  }
}

impl Store for SqliteStore {
  type Error = Error;

  async fn save_session(&self, record: &SessionRecord) -> Result<(), Self::Error> {
    sqlx::query(
      r#"
      INSERT INTO sessions (session_uuid, contact_uuid, status, data, updated_at)
      VALUES (?, ?, ?, ?, ?)
      ON CONFLICT (session_uuid) DO UPDATE SET
        contact_uuid = excluded.contact_uuid,
        status = excluded.status,
        data = excluded.data,
        updated_at = excluded.updated_at
      "#,
    )
    .bind(&record.session_uuid)
    .bind(&record.contact_uuid)
    .bind(&record.status)
    .bind(&record.data)
    .bind(record.updated_at)
    .execute(&self.pool)
    .await?;

    debug!(session_uuid = %record.session_uuid, status = %record.status, "session saved");
    Ok(())
  }

  async fn get_session(&self, session_uuid: &str) -> Result<SessionRecord, Self::Error> {
    sqlx::query_as(
      r#"
      SELECT session_uuid, contact_uuid, status, data, updated_at
      FROM sessions
      WHERE session_uuid = ?
      "#,
    )
    .bind(session_uuid)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| Error::NotFound(session_uuid.to_string()))
  }

  async fn list_sessions(&self, status: SessionStatus) -> Result<Vec<SessionRecord>, Self::Error> {
    let records = sqlx::query_as(
      r#"
      SELECT session_uuid, contact_uuid, status, data, updated_at
      FROM sessions
      WHERE status = ?
      ORDER BY updated_at ASC, session_uuid ASC
      "#,
    )
    .bind(status.to_string())
    .fetch_all(&self.pool)
    .await?;
    Ok(records)
  }

  async fn list_contact_sessions(
    &self,
    contact_uuid: &str,
  ) -> Result<Vec<SessionRecord>, Self::Error> {
    let records = sqlx::query_as(
      r#"
      SELECT session_uuid, contact_uuid, status, data, updated_at
      FROM sessions
      WHERE contact_uuid = ?
      ORDER BY updated_at ASC, session_uuid ASC
      "#,
    )
    .bind(contact_uuid)
    .fetch_all(&self.pool)
    .await?;
    Ok(records)
  }

  async fn delete_session(&self, session_uuid: &str) -> Result<(), Self::Error> {
    sqlx::query("DELETE FROM sessions WHERE session_uuid = ?")
      .bind(session_uuid)
      .execute(&self.pool)
      .await?;
    Ok(())
  }
}
