//! Database schema definitions
//!
//! This module contains the SQL schema of the Crawl-Starter index store.

/// SQL schema for the index store
pub const SCHEMA_SQL: &str = r#"
-- Mutable indexes (crawler tracking entries)
CREATE TABLE IF NOT EXISTS index_documents (
    index_name TEXT NOT NULL,
    doc_id TEXT NOT NULL,
    body TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (index_name, doc_id)
);

-- Append-only crawl-start audit records
CREATE TABLE IF NOT EXISTS crawlstarts (
    crawl_id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    mustmatch TEXT NOT NULL,
    collections TEXT NOT NULL,
    start_url TEXT NOT NULL,
    start_ssld TEXT NOT NULL,
    init_date TEXT NOT NULL,
    data TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crawlstarts_start_url ON crawlstarts(start_url);
CREATE INDEX IF NOT EXISTS idx_crawlstarts_user ON crawlstarts(user_id);
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
