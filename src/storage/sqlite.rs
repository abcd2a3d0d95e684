//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the IndexStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{FieldQuery, IndexStore, QueryField, StorageError, StorageResult};
use crate::storage::CrawlstartRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// SQLite index store backend
pub struct SqliteIndexStore {
    conn: Mutex<Connection>,
    crawlstart_index: String,
}

impl SqliteIndexStore {
    /// Creates a new SqliteIndexStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteIndexStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Several seed pipelines write concurrently through this handle
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self::from_connection(conn))
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Sets the name of the append-only audit index
    pub fn with_crawlstart_index(mut self, name: &str) -> Self {
        self.crawlstart_index = name.to_string();
        self
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            crawlstart_index: "crawlstart".to_string(),
        }
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("connection mutex poisoned".to_string()))
    }

    fn ensure_mutable(&self, index: &str) -> StorageResult<()> {
        if index == self.crawlstart_index {
            return Err(StorageError::ImmutableIndex(index.to_string()));
        }
        Ok(())
    }
}

/// JSON path of a top-level body field
fn json_path(field: &str) -> String {
    format!("$.{}", field)
}

impl IndexStore for SqliteIndexStore {
    fn put_document(&self, index: &str, id: &str, body: &Value) -> StorageResult<()> {
        self.ensure_mutable(index)?;
        let body = serde_json::to_string(body)?;
        let now = Utc::now().to_rfc3339();

        self.conn()?.execute(
            "INSERT INTO index_documents (index_name, doc_id, body, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(index_name, doc_id) DO UPDATE SET body = ?3, updated_at = ?4",
            params![index, id, body, now],
        )?;
        Ok(())
    }

    fn delete(&self, index: &str, query: &FieldQuery) -> StorageResult<u64> {
        self.ensure_mutable(index)?;
        let conn = self.conn()?;

        let deleted = match &query.field {
            QueryField::Id => conn.execute(
                "DELETE FROM index_documents WHERE index_name = ?1 AND doc_id = ?2",
                params![index, query.value],
            )?,
            QueryField::Field(field) => conn.execute(
                "DELETE FROM index_documents
                 WHERE index_name = ?1 AND json_extract(body, ?2) = ?3",
                params![index, json_path(field), query.value],
            )?,
        };

        Ok(deleted as u64)
    }

    fn count(&self, index: &str, query: Option<&FieldQuery>) -> StorageResult<u64> {
        let conn = self.conn()?;

        let count: i64 = match query.map(|q| (&q.field, &q.value)) {
            None => conn.query_row(
                "SELECT COUNT(*) FROM index_documents WHERE index_name = ?1",
                params![index],
                |row| row.get(0),
            )?,
            Some((QueryField::Id, value)) => conn.query_row(
                "SELECT COUNT(*) FROM index_documents WHERE index_name = ?1 AND doc_id = ?2",
                params![index, value],
                |row| row.get(0),
            )?,
            Some((QueryField::Field(field), value)) => conn.query_row(
                "SELECT COUNT(*) FROM index_documents
                 WHERE index_name = ?1 AND json_extract(body, ?2) = ?3",
                params![index, json_path(field), value],
                |row| row.get(0),
            )?,
        };

        Ok(count as u64)
    }

    fn store_crawlstart(&self, record: &CrawlstartRecord) -> StorageResult<()> {
        let collections = serde_json::to_string(&record.collections)?;
        let data = serde_json::to_string(&record.data)?;
        let init_date = record
            .init_date
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        let result = self.conn()?.execute(
            "INSERT INTO crawlstarts
             (crawl_id, user_id, mustmatch, collections, start_url, start_ssld, init_date, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.crawl_id,
                record.user_id,
                record.mustmatch,
                collections,
                record.start_url,
                record.start_ssld,
                init_date,
                data
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::DuplicateRecord(record.crawl_id.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn get_crawlstart(&self, crawl_id: &str) -> StorageResult<Option<CrawlstartRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT crawl_id, user_id, mustmatch, collections, start_url, start_ssld,
                    init_date, data
             FROM crawlstarts WHERE crawl_id = ?1",
        )?;

        let row = stmt
            .query_row(params![crawl_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })
            .optional()?;

        let Some((
            crawl_id,
            user_id,
            mustmatch,
            collections,
            start_url,
            start_ssld,
            init_date,
            data,
        )) = row
        else {
            return Ok(None);
        };

        let init_date = DateTime::parse_from_rfc3339(&init_date)
            .map_err(|e| {
                StorageError::Database(format!("Invalid init_date '{}': {}", init_date, e))
            })?
            .with_timezone(&Utc);

        Ok(Some(CrawlstartRecord {
            crawl_id,
            user_id,
            mustmatch,
            collections: serde_json::from_str(&collections)?,
            start_url,
            start_ssld,
            init_date,
            data: serde_json::from_str(&data)?,
        }))
    }

    fn count_crawlstarts(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn()?
                .query_row("SELECT COUNT(*) FROM crawlstarts", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
