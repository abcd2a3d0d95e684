//! Crawl-start orchestration
//!
//! This module turns a crawl request into published crawl jobs:
//! - Normalizing caller parameters against the template
//! - Deriving per-seed crawl ids
//! - Recording audit entries and clearing stale tracking state
//! - Routing and publishing jobs, and aggregating the per-seed results

pub mod coordinator;
mod identity;
mod job;
mod normalize;
mod reconcile;
mod response;

pub use coordinator::CrawlStarter;
pub use identity::{crawl_id, url_fingerprint};
pub use job::{ActionDescriptor, Assets, CrawlJob, QueueMessage, RootAsset, ROOT_ASSET};
pub use normalize::{
    normalize_request, parse_collections, CrawlRequest, ANONYMOUS_USER, MAX_CRAWLING_DEPTH,
    USER_ID,
};
pub use reconcile::{reconcile, CleanupReport};
pub use response::{CrawlStartResponse, SeedFailure, SeedOutcome};

use crate::broker::{Broker, BrokerError, BrokerResult, ShardingMethod, SqliteBroker};
use crate::config::Config;
use crate::storage::{IndexStore, SqliteIndexStore, StorageError, StorageResult};
use crate::template::CrawlStartTemplate;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Where and how crawl jobs are routed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingSettings {
    pub service: String,
    pub queues: Vec<String>,
    pub method: ShardingMethod,
    pub dimensions: Vec<u32>,
}

/// Orchestrator settings derived from the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStartSettings {
    pub crawler_index: String,
    pub crawlstart_index: String,
    pub routing: RoutingSettings,
    pub max_concurrent_seeds: usize,
    pub operation_timeout: Duration,
}

impl CrawlStartSettings {
    pub fn from_config(config: &Config) -> crate::ConfigResult<Self> {
        Ok(Self {
            crawler_index: config.store.crawler_index.clone(),
            crawlstart_index: config.store.crawlstart_index.clone(),
            routing: RoutingSettings {
                service: config.broker.service.clone(),
                queues: config.broker.queues(),
                method: config.broker.sharding()?,
                dimensions: config.broker.priority_dimensions.clone(),
            },
            max_concurrent_seeds: config.orchestrator.max_concurrent_seeds,
            operation_timeout: Duration::from_millis(config.orchestrator.operation_timeout_ms),
        })
    }
}

impl Default for CrawlStartSettings {
    fn default() -> Self {
        Self {
            crawler_index: "crawler".to_string(),
            crawlstart_index: "crawlstart".to_string(),
            routing: RoutingSettings {
                service: "crawler".to_string(),
                queues: vec!["crawler_00".to_string()],
                method: ShardingMethod::Balance,
                dimensions: vec![1],
            },
            max_concurrent_seeds: 4,
            operation_timeout: Duration::from_secs(10),
        }
    }
}

/// Everything a crawl start needs, built once at start-up
pub struct CrawlStartContext {
    pub store: Arc<dyn IndexStore>,
    pub broker: Arc<dyn Broker>,
    pub template: CrawlStartTemplate,
    pub settings: CrawlStartSettings,
}

impl CrawlStartContext {
    pub fn new(
        store: Arc<dyn IndexStore>,
        broker: Arc<dyn Broker>,
        template: CrawlStartTemplate,
        settings: CrawlStartSettings,
    ) -> Self {
        Self {
            store,
            broker,
            template,
            settings,
        }
    }

    /// Opens the SQLite store and broker named in the configuration
    ///
    /// Template overrides that cannot be used are logged and skipped.
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let settings = CrawlStartSettings::from_config(config)?;

        let store = SqliteIndexStore::new(Path::new(&config.store.database_path))?
            .with_crawlstart_index(&settings.crawlstart_index);
        let broker = SqliteBroker::new(Path::new(&config.broker.database_path))?;

        let (template, rejected) = CrawlStartTemplate::with_overrides(&config.template);
        for error in &rejected {
            tracing::warn!("Ignoring template override: {}", error);
        }
        tracing::debug!("Crawl-start template has {} options", template.len());

        Ok(Self::new(
            Arc::new(store),
            Arc::new(broker),
            template,
            settings,
        ))
    }

    fn timeout_ms(&self) -> u64 {
        self.settings.operation_timeout.as_millis() as u64
    }

    /// Runs a store call on the blocking pool, bounded by the operation timeout
    ///
    /// A timed-out call keeps running in the background; its result is discarded.
    pub async fn with_store<T, F>(&self, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn IndexStore) -> StorageResult<T> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let task = tokio::task::spawn_blocking(move || op(store.as_ref()));

        match tokio::time::timeout(self.settings.operation_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(StorageError::Database(format!("store task failed: {}", e))),
            Err(_) => Err(StorageError::Timeout(self.timeout_ms())),
        }
    }

    /// Runs a broker call on the blocking pool, bounded by the operation timeout
    pub async fn with_broker<T, F>(&self, op: F) -> BrokerResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn Broker) -> BrokerResult<T> + Send + 'static,
    {
        let broker = Arc::clone(&self.broker);
        let task = tokio::task::spawn_blocking(move || op(broker.as_ref()));

        match tokio::time::timeout(self.settings.operation_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(BrokerError::Unavailable(format!("broker task failed: {}", e))),
            Err(_) => Err(BrokerError::Timeout(self.timeout_ms())),
        }
    }
}
