//! Crawl-Starter: turns crawl requests into sharded crawl jobs
//!
//! This crate implements the crawl-start orchestrator of a distributed crawler. A single
//! request carrying one or more seed URLs is normalized against the crawl-start template,
//! split into independent seeds, recorded in an append-only audit index, cleared of stale
//! tracking state, routed to a worker queue and published to the broker.

pub mod broker;
pub mod config;
pub mod crawlstart;
pub mod output;
pub mod storage;
pub mod template;
pub mod url;

use thiserror::Error;

/// Main error type for Crawl-Starter operations
#[derive(Debug, Error)]
pub enum StartError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Broker error: {0}")]
    Broker(#[from] broker::BrokerError),

    #[error("Crawl request has no crawlingURL")]
    MissingSeedUrl,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown sharding method: {0}")]
    UnknownShardingMethod(String),
}

/// URL-specific errors
#[derive(Debug, Clone, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Problems with crawl-start option values
///
/// Neither variant is fatal: the offending value is dropped and the caller logs it.
#[derive(Debug, Error)]
pub enum OptionError {
    #[error("Unrecognized option type for '{key}': {found}")]
    UnrecognizedOptionType { key: String, found: String },

    #[error("Option '{key}' expects {expected}, got {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: String,
    },

    #[error("Invalid pattern for collection '{name}': {source}")]
    InvalidCollectionPattern { name: String, source: regex::Error },
}

/// Failures confined to a single seed of a crawl request
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Malformed seed URL '{seed}': {source}")]
    MalformedSeedUrl { seed: String, source: UrlError },

    #[error("Failed to store crawlstart record {crawl_id}: {source}")]
    AuditPersistFailure {
        crawl_id: String,
        source: storage::StorageError,
    },

    #[error("Failed to clean up tracking entries for {url}: {source}")]
    CleanupFailure {
        url: String,
        source: storage::StorageError,
    },

    #[error("Failed to route crawl {crawl_id}: {source}")]
    RoutingFailure {
        crawl_id: String,
        source: broker::BrokerError,
    },

    /// The audit record of the crawl exists. If `source` is a timeout, the send may
    /// still have completed and the job may be in the queue; check the queue before
    /// publishing the crawl again.
    #[error("Failed to publish crawl {crawl_id} to queue {queue}: {source}")]
    PublishFailure {
        crawl_id: String,
        queue: String,
        source: broker::BrokerError,
    },
}

/// Result type alias for Crawl-Starter operations
pub type Result<T> = std::result::Result<T, StartError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawlstart::{CrawlStartContext, CrawlStartResponse, CrawlStarter};
pub use template::{CrawlStartTemplate, OptionValue};
pub use url::{normalize_url, smart_sld, split_seed_urls, SeedUrl};
