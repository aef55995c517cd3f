//! Storage module for persisting scrape results
//!
//! This module handles the optional persistence layer:
//! - SQLite database initialization and schema management
//! - One record per (user, project), successful or failed
//! - History, recency and aggregate queries

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    ScrapeStore, StorageError, StorageResult, DEFAULT_HISTORY_LIMIT, DEFAULT_RECENT_DAYS,
};

use rand::Rng;
use serde::Serialize;
use std::path::Path;

/// Opens or creates a scrape store
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized store
/// * `Err(StorageError)` - Failed to open the database
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}

/// A persisted scrape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistedRecord {
    pub user_id: String,
    pub project_id: String,
    pub url: String,
    /// Capture time in unix seconds
    pub timestamp: i64,
    /// The serialized report; an empty object for failed runs
    pub payload: serde_json::Value,
    pub status: RecordStatus,
    pub error_message: Option<String>,
}

/// Outcome of a persisted scrape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Failed,
}

impl RecordStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Aggregate counts over a store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total_records: u64,
    pub successful: u64,
    pub failed: u64,
    pub distinct_users: u64,
}

/// Generates a project id of the form `proj_<unix-seconds>_<8 hex chars>`
pub fn generate_project_id<R: Rng + ?Sized>(rng: &mut R, now: i64) -> String {
    let suffix: [u8; 4] = rng.gen();
    format!("proj_{}_{}", now, hex::encode(suffix))
}
