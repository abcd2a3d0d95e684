//! Storage traits and error types
//!
//! This module defines the trait interface for index store backends, the field
//! queries they accept, and associated error types.

use crate::storage::CrawlstartRecord;
use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Index '{0}' is append-only")]
    ImmutableIndex(String),

    #[error("Crawlstart record already exists: {0}")]
    DuplicateRecord(String),

    #[error("Store operation timed out after {0}ms")]
    Timeout(u64),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Document attribute a [`FieldQuery`] matches on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryField {
    /// The document id (`_id`)
    Id,
    /// A top-level field of the document body
    Field(String),
}

/// Exact-match query on one document attribute
///
/// Parsed from the JSON form `{ "<field>": "<value>" }`. A `.keyword` suffix on the
/// field name asks for exact matching, which is the only mode supported, so it is stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldQuery {
    pub field: QueryField,
    pub value: String,
}

impl FieldQuery {
    /// Matches the document with the given id
    pub fn id(value: impl Into<String>) -> Self {
        Self {
            field: QueryField::Id,
            value: value.into(),
        }
    }

    /// Matches documents whose `field` equals `value`
    pub fn field(name: &str, value: impl Into<String>) -> StorageResult<Self> {
        let name = name.strip_suffix(".keyword").unwrap_or(name);

        if name == "_id" {
            return Ok(Self::id(value));
        }

        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(StorageError::InvalidQuery(format!(
                "unsupported field name '{}'",
                name
            )));
        }

        Ok(Self {
            field: QueryField::Field(name.to_string()),
            value: value.into(),
        })
    }

    /// Parses `{ "<field>": "<value>" }`
    ///
    /// # Examples
    ///
    /// ```
    /// use crawl_starter::storage::{FieldQuery, QueryField};
    /// use serde_json::json;
    ///
    /// let query = json!({ "start_url.keyword": "http://a.example/" });
    /// let query = FieldQuery::from_json(&query).unwrap();
    /// assert_eq!(query.field, QueryField::Field("start_url".to_string()));
    /// ```
    pub fn from_json(query: &Value) -> StorageResult<Self> {
        let object = query
            .as_object()
            .ok_or_else(|| {
                StorageError::InvalidQuery(format!("expected an object, got {}", query))
            })?;

        if object.len() != 1 {
            return Err(StorageError::InvalidQuery(format!(
                "expected exactly one field, got {}",
                object.len()
            )));
        }

        let (name, value) = object
            .iter()
            .next()
            .ok_or_else(|| StorageError::InvalidQuery("empty query".to_string()))?;

        let value = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            other => {
                return Err(StorageError::InvalidQuery(format!(
                    "unsupported value for '{}': {}",
                    name, other
                )))
            }
        };

        Self::field(name, value)
    }
}

/// Trait for document/index store backends
///
/// Implementations are shared between concurrently running seed pipelines and must
/// synchronize access internally.
pub trait IndexStore: Send + Sync {
    /// Inserts or replaces a document in a mutable index
    fn put_document(&self, index: &str, id: &str, body: &Value) -> StorageResult<()>;

    /// Deletes every document of `index` matching `query`
    ///
    /// # Returns
    ///
    /// The number of deleted documents; zero when nothing matched
    fn delete(&self, index: &str, query: &FieldQuery) -> StorageResult<u64>;

    /// Counts documents of `index`, optionally restricted to those matching `query`
    fn count(&self, index: &str, query: Option<&FieldQuery>) -> StorageResult<u64>;

    /// Appends an audit record
    ///
    /// Fails with [`StorageError::DuplicateRecord`] when the crawl id is already taken;
    /// existing records are never overwritten.
    fn store_crawlstart(&self, record: &CrawlstartRecord) -> StorageResult<()>;

    /// Gets an audit record by crawl id
    fn get_crawlstart(&self, crawl_id: &str) -> StorageResult<Option<CrawlstartRecord>>;

    /// Counts all audit records
    fn count_crawlstarts(&self) -> StorageResult<u64>;
}
