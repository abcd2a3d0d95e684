//! Storage module for crawl-start state
//!
//! This module handles all index store operations of the orchestrator, including:
//! - SQLite database initialization and schema management
//! - Crawler tracking documents and their field-query deletion
//! - Append-only crawl-start audit records

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteIndexStore;
pub use traits::{FieldQuery, IndexStore, QueryField, StorageError, StorageResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initializes or opens an index store database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
/// * `crawlstart_index` - Name of the append-only audit index
pub fn open_store(path: &Path, crawlstart_index: &str) -> StorageResult<SqliteIndexStore> {
    Ok(SqliteIndexStore::new(path)?.with_crawlstart_index(crawlstart_index))
}

/// Audit record of one started crawl
///
/// Written once per crawl job and never updated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlstartRecord {
    pub crawl_id: String,
    pub user_id: String,
    pub mustmatch: String,
    /// Collection names the crawl feeds into
    pub collections: Vec<String>,
    pub start_url: String,
    pub start_ssld: String,
    pub init_date: DateTime<Utc>,
    /// The complete crawl job as published
    pub data: serde_json::Value,
}
