//! Message broker module
//!
//! Crawl jobs are published to per-service queues. This module provides the broker
//! trait, the shard router choosing a queue for each job, and a SQLite-backed broker.

mod routing;
mod sqlite;
mod traits;

pub use routing::select_queue;
pub use sqlite::SqliteBroker;
pub use traits::{Broker, BrokerError, BrokerResult, ShardingMethod};
