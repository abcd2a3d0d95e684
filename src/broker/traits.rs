//! Broker trait and error types

use crate::broker::routing::select_queue;
use crate::ConfigError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur while routing or sending messages
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to encode message: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Broker unavailable: {0}")]
    Unavailable(String),

    #[error("Routing error: {0}")]
    Routing(String),

    /// The abandoned call keeps running and may still take effect
    #[error("Broker operation timed out after {0}ms; it may still have completed")]
    Timeout(u64),
}

/// Result type for broker operations
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Strategy for spreading jobs over the queues of a priority band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShardingMethod {
    /// Rendezvous hashing: adding a queue moves only the keys it wins
    Balance,
    /// Plain modulo over the band
    Hash,
}

impl ShardingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balance => "balance",
            Self::Hash => "hash",
        }
    }
}

impl FromStr for ShardingMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balance" => Ok(Self::Balance),
            "hash" => Ok(Self::Hash),
            other => Err(ConfigError::UnknownShardingMethod(other.to_string())),
        }
    }
}

impl fmt::Display for ShardingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Message broker the crawl jobs are published to
///
/// Implementations are shared between concurrently running seed pipelines and must
/// synchronize access internally.
pub trait Broker: Send + Sync {
    /// Picks the destination queue for a job
    ///
    /// # Arguments
    ///
    /// * `service` - Service type the job is addressed to
    /// * `queues` - Ordered source queues of the service
    /// * `method` - Sharding method inside a priority band
    /// * `dimensions` - Number of queues per priority band
    /// * `priority` - Job priority selecting the band
    /// * `key` - Distribution key, usually the seed host
    fn queue_name(
        &self,
        service: &str,
        queues: &[String],
        method: ShardingMethod,
        dimensions: &[u32],
        priority: i32,
        key: &str,
    ) -> BrokerResult<String> {
        let _ = service;
        select_queue(queues, method, dimensions, priority, key)
    }

    /// Appends a message to a queue
    fn send(&self, service: &str, queue: &str, payload: &[u8]) -> BrokerResult<()>;

    /// Number of messages waiting in a queue
    fn available(&self, service: &str, queue: &str) -> BrokerResult<u64>;
}
