//! Storage traits and error types
//!
//! This module defines the trait interface for scrape stores and the
//! associated error types.

use crate::storage::{PersistedRecord, StoreStats};
use chrono::Utc;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Default number of records returned by [`ScrapeStore::records_for_user`]
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Default window of [`ScrapeStore::recent_records`], in days
pub const DEFAULT_RECENT_DAYS: u32 = 7;

/// Trait for scrape store implementations
///
/// Records are keyed by `(user_id, project_id)`; writing a record with an
/// existing key replaces it.
pub trait ScrapeStore {
    /// Inserts or replaces a record
    fn put_record(&mut self, record: &PersistedRecord) -> StorageResult<()>;

    /// Gets a single record
    fn get_record(&self, user_id: &str, project_id: &str)
        -> StorageResult<Option<PersistedRecord>>;

    /// Deletes a record
    ///
    /// # Returns
    ///
    /// `true` if a record existed and was removed
    fn delete_record(&mut self, user_id: &str, project_id: &str) -> StorageResult<bool>;

    /// Gets the records of a user, newest first
    ///
    /// # Arguments
    ///
    /// * `user_id` - Owner of the records
    /// * `limit` - Maximum number of records to return
    fn records_for_user(&self, user_id: &str, limit: usize) -> StorageResult<Vec<PersistedRecord>>;

    /// Gets the records of a user captured at or after `since` (unix seconds), newest first
    fn records_since(&self, user_id: &str, since: i64) -> StorageResult<Vec<PersistedRecord>>;

    /// Gets aggregate counts over the whole store
    fn stats(&self) -> StorageResult<StoreStats>;

    /// Gets the records of a user captured within the last `days` days
    fn recent_records(&self, user_id: &str, days: u32) -> StorageResult<Vec<PersistedRecord>> {
        let since = Utc::now().timestamp() - i64::from(days) * 24 * 60 * 60;
        self.records_since(user_id, since)
    }
}
