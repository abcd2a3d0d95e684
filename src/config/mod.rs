//! Configuration module for Crawl-Starter
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use crawl_starter::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl-starter.toml")).unwrap();
//! println!("Jobs go to service: {}", config.broker.service);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{BrokerConfig, Config, OrchestratorConfig, StoreConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
