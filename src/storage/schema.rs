//! Database schema definitions
//!
//! This module contains the SQL schema of the Page-Lens scrape store.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per (user, project); a re-run of a project replaces its row
CREATE TABLE IF NOT EXISTS scrapes (
    user_id TEXT NOT NULL,
    project_id TEXT NOT NULL,
    url TEXT NOT NULL,
    timestamp INTEGER NOT NULL,
    payload TEXT NOT NULL,
    status TEXT NOT NULL,
    error_message TEXT,
    PRIMARY KEY (user_id, project_id)
);

CREATE INDEX IF NOT EXISTS idx_scrapes_user_time ON scrapes(user_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_scrapes_status ON scrapes(status);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
