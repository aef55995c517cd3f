//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ScrapeStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ScrapeStore, StorageError, StorageResult};
use crate::storage::{PersistedRecord, RecordStatus, StoreStats};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RECORD_COLUMNS: &str =
    "user_id, project_id, url, timestamp, payload, status, error_message";

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_records(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> StorageResult<Vec<PersistedRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, StoredRow::read)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(StoredRow::into_record).collect()
    }
}

/// A row as stored, before payload and status are decoded
struct StoredRow {
    user_id: String,
    project_id: String,
    url: String,
    timestamp: i64,
    payload: String,
    status: String,
    error_message: Option<String>,
}

impl StoredRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            user_id: row.get(0)?,
            project_id: row.get(1)?,
            url: row.get(2)?,
            timestamp: row.get(3)?,
            payload: row.get(4)?,
            status: row.get(5)?,
            error_message: row.get(6)?,
        })
    }

    fn into_record(self) -> StorageResult<PersistedRecord> {
        let status = RecordStatus::from_db_string(&self.status).ok_or_else(|| {
            StorageError::InvalidValue(format!("unknown record status '{}'", self.status))
        })?;

        Ok(PersistedRecord {
            user_id: self.user_id,
            project_id: self.project_id,
            url: self.url,
            timestamp: self.timestamp,
            payload: serde_json::from_str(&self.payload)?,
            status,
            error_message: self.error_message,
        })
    }
}

impl ScrapeStore for SqliteStore {
    fn put_record(&mut self, record: &PersistedRecord) -> StorageResult<()> {
        let payload = serde_json::to_string(&record.payload)?;
        self.conn.execute(
            &format!(
                "INSERT OR REPLACE INTO scrapes ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                RECORD_COLUMNS
            ),
            params![
                record.user_id,
                record.project_id,
                record.url,
                record.timestamp,
                payload,
                record.status.to_db_string(),
                record.error_message,
            ],
        )?;
        Ok(())
    }

    fn get_record(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> StorageResult<Option<PersistedRecord>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM scrapes WHERE user_id = ?1 AND project_id = ?2",
                    RECORD_COLUMNS
                ),
                params![user_id, project_id],
                StoredRow::read,
            )
            .optional()?;

        row.map(StoredRow::into_record).transpose()
    }

    fn delete_record(&mut self, user_id: &str, project_id: &str) -> StorageResult<bool> {
        let deleted = self.conn.execute(
            "DELETE FROM scrapes WHERE user_id = ?1 AND project_id = ?2",
            params![user_id, project_id],
        )?;
        Ok(deleted > 0)
    }

    fn records_for_user(&self, user_id: &str, limit: usize) -> StorageResult<Vec<PersistedRecord>> {
        self.query_records(
            &format!(
                "SELECT {} FROM scrapes WHERE user_id = ?1 ORDER BY timestamp DESC LIMIT ?2",
                RECORD_COLUMNS
            ),
            params![user_id, limit as i64],
        )
    }

    fn records_since(&self, user_id: &str, since: i64) -> StorageResult<Vec<PersistedRecord>> {
        self.query_records(
            &format!(
                "SELECT {} FROM scrapes WHERE user_id = ?1 AND timestamp >= ?2
                 ORDER BY timestamp DESC",
                RECORD_COLUMNS
            ),
            params![user_id, since],
        )
    }

    fn stats(&self) -> StorageResult<StoreStats> {
        let stats = self.conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN status = ?1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN status = ?2 THEN 1 ELSE 0 END), 0),
                COUNT(DISTINCT user_id)
             FROM scrapes",
            params![
                RecordStatus::Success.to_db_string(),
                RecordStatus::Failed.to_db_string()
            ],
            |row| {
                Ok(StoreStats {
                    total_records: row.get::<_, i64>(0)? as u64,
                    successful: row.get::<_, i64>(1)? as u64,
                    failed: row.get::<_, i64>(2)? as u64,
                    distinct_users: row.get::<_, i64>(3)? as u64,
                })
            },
        )?;
        Ok(stats)
    }
}
