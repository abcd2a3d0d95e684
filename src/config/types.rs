use crate::broker::ShardingMethod;
use crate::ConfigError;
use serde::Deserialize;

/// Main configuration structure for Crawl-Starter
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    pub broker: BrokerConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    /// Typed overrides of the built-in crawl-start defaults
    #[serde(default)]
    pub template: toml::Table,
}

/// Index store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Index holding per-URL crawler tracking entries
    #[serde(rename = "crawler-index", default = "default_crawler_index")]
    pub crawler_index: String,

    /// Append-only index holding crawl-start audit records
    #[serde(rename = "crawlstart-index", default = "default_crawlstart_index")]
    pub crawlstart_index: String,
}

/// Message broker and sharding configuration
#[derive(Debug, Clone, Deserialize)]
pub struct BrokerConfig {
    /// Path to the SQLite database file backing the queues
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Service type the crawl jobs are addressed to
    #[serde(default = "default_service")]
    pub service: String,

    /// Ordered source queues; generated from the service name when omitted
    #[serde(rename = "source-queues", default)]
    pub source_queues: Option<Vec<String>>,

    /// Either "balance" or "hash"
    #[serde(rename = "sharding-method", default = "default_sharding_method")]
    pub sharding_method: String,

    /// Number of queues per priority band
    #[serde(rename = "priority-dimensions", default = "default_priority_dimensions")]
    pub priority_dimensions: Vec<u32>,
}

impl BrokerConfig {
    /// Returns the configured source queues, or `<service>_00 ..` for every band slot
    pub fn queues(&self) -> Vec<String> {
        match &self.source_queues {
            Some(queues) => queues.clone(),
            None => {
                let total: u32 = self.priority_dimensions.iter().sum();
                (0..total)
                    .map(|i| format!("{}_{:02}", self.service, i))
                    .collect()
            }
        }
    }

    /// Parses the configured sharding method
    pub fn sharding(&self) -> Result<ShardingMethod, ConfigError> {
        self.sharding_method.parse()
    }
}

/// Orchestrator behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum number of seed pipelines running at once
    #[serde(rename = "max-concurrent-seeds", default = "default_max_concurrent_seeds")]
    pub max_concurrent_seeds: usize,

    /// Timeout for a single store or broker call (milliseconds)
    #[serde(rename = "operation-timeout-ms", default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_seeds: default_max_concurrent_seeds(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

fn default_crawler_index() -> String {
    "crawler".to_string()
}

fn default_crawlstart_index() -> String {
    "crawlstart".to_string()
}

fn default_service() -> String {
    "crawler".to_string()
}

fn default_sharding_method() -> String {
    "balance".to_string()
}

fn default_priority_dimensions() -> Vec<u32> {
    vec![1]
}

fn default_max_concurrent_seeds() -> usize {
    4
}

fn default_operation_timeout_ms() -> u64 {
    10_000
}
