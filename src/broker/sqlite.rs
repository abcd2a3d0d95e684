//! SQLite broker implementation
//!
//! Queues are rows of a single table keyed by service and queue name. Messages are
//! appended by `send` and left for downstream workers to consume.

use crate::broker::traits::{Broker, BrokerError, BrokerResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const QUEUE_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS queue_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    service TEXT NOT NULL,
    queue TEXT NOT NULL,
    payload BLOB NOT NULL,
    enqueued_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_queue_messages_queue ON queue_messages(service, queue);
"#;

/// SQLite-backed message broker
pub struct SqliteBroker {
    conn: Mutex<Connection>,
}

impl SqliteBroker {
    /// Opens or creates the broker database at `path`
    pub fn new(path: &Path) -> BrokerResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
        ",
        )?;
        conn.execute_batch(QUEUE_SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory broker
    pub fn open_in_memory() -> BrokerResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(QUEUE_SCHEMA_SQL)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> BrokerResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| BrokerError::Unavailable("connection mutex poisoned".to_string()))
    }

    /// Returns up to `limit` waiting payloads of a queue, oldest first
    pub fn peek(&self, service: &str, queue: &str, limit: usize) -> BrokerResult<Vec<Vec<u8>>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT payload FROM queue_messages
             WHERE service = ?1 AND queue = ?2
             ORDER BY id ASC LIMIT ?3",
        )?;

        let payloads = stmt
            .query_map(params![service, queue, limit as i64], |row| row.get(0))?
            .collect::<Result<Vec<Vec<u8>>, _>>()?;

        Ok(payloads)
    }
}

impl Broker for SqliteBroker {
    fn send(&self, service: &str, queue: &str, payload: &[u8]) -> BrokerResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT INTO queue_messages (service, queue, payload, enqueued_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![service, queue, payload, now],
        )?;
        Ok(())
    }

    fn available(&self, service: &str, queue: &str) -> BrokerResult<u64> {
        let count: i64 = self.conn()?.query_row(
            "SELECT COUNT(*) FROM queue_messages WHERE service = ?1 AND queue = ?2",
            params![service, queue],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
