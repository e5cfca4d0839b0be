//! Sluice Store
//!
//! This crate provides the storage trait and implementations for persisted
//! sessions. A waiting session is saved between sprints and read back when
//! its resume arrives.
//!
//! The [`Store`] trait defines operations for:
//! - Saving a session, replacing any previous version
//! - Getting a session by UUID
//! - Listing sessions by status or contact
//! - Deleting a session

mod error;
mod memory;
mod record;
mod sqlite;

pub use error::Error;
pub use memory::MemoryStore;
pub use record::SessionRecord;
pub use sqlite::SqliteStore;

use sluice_engine::SessionStatus;

/// Storage trait for sessions.
pub trait Store {
  /// Error type for storage operations.
  type Error;

  /// Save a session record, replacing the stored one with the same UUID.
  fn save_session(
    &self,
    record: &SessionRecord,
  ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;

  /// Get a session record by UUID.
  fn get_session(
    &self,
    session_uuid: &str,
  ) -> impl std::future::Future<Output = Result<SessionRecord, Self::Error>> + Send;

  /// List sessions with the given status, least recently updated first.
  fn list_sessions(
    &self,
    status: SessionStatus,
  ) -> impl std::future::Future<Output = Result<Vec<SessionRecord>, Self::Error>> + Send;

  /// List the sessions of a contact, least recently updated first.
  fn list_contact_sessions(
    &self,
    contact_uuid: &str,
  ) -> impl std::future::Future<Output = Result<Vec<SessionRecord>, Self::Error>> + Send;

  /// Delete a session. Deleting an unknown session is not an error.
  fn delete_session(
    &self,
    session_uuid: &str,
  ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;
}
