//! Crawl-Starter main entry point
//!
//! This is the command-line interface for the Crawl-Starter orchestrator.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use crawl_starter::config::{load_config_with_hash, Config};
use crawl_starter::crawlstart::{CrawlStartContext, CrawlStarter, USER_ID};
use crawl_starter::output::{load_statistics, print_statistics};
use crawl_starter::storage::{open_store, IndexStore};
use crawl_starter::template::{CrawlStartTemplate, CRAWLING_URL};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Crawl-Starter: turns crawl requests into sharded crawl jobs
///
/// Each seed URL of a request becomes one crawl job. Jobs are recorded in an append-only
/// audit index, stale tracking entries of their start URLs are removed, and the jobs are
/// published to the crawler queues.
#[derive(Parser, Debug)]
#[command(name = "crawl-starter")]
#[command(version = "1.0.0")]
#[command(about = "Crawl-start orchestrator for a distributed crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start crawls for one or more seed URLs and print the response
    Start {
        /// Seed URLs, separated by commas, spaces, newlines or '|'
        #[arg(value_name = "URLS")]
        urls: String,

        /// User the crawls are started for
        #[arg(long)]
        user_id: Option<String>,

        /// Set a crawl-start option (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        options: Vec<String>,
    },

    /// Print the audit record of a started crawl
    Show {
        #[arg(value_name = "CRAWL_ID")]
        crawl_id: String,
    },

    /// Show waiting messages per queue and the number of recorded crawl starts
    Queues,

    /// Validate the configuration and print the effective crawl-start template
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    match cli.command {
        Command::Start {
            urls,
            user_id,
            options,
        } => handle_start(&config, urls, user_id, &options).await,
        Command::Show { crawl_id } => handle_show(&config, &crawl_id),
        Command::Queues => handle_queues(&config),
        Command::Check => handle_check(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("crawl_starter=info,warn"),
            1 => EnvFilter::new("crawl_starter=debug,info"),
            2 => EnvFilter::new("crawl_starter=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Parses `KEY=VALUE` option arguments into caller parameters
fn parse_options(options: &[String]) -> anyhow::Result<Map<String, Value>> {
    let mut params = Map::new();
    for option in options {
        let Some((key, value)) = option.split_once('=') else {
            bail!("Option '{}' must have the form KEY=VALUE", option);
        };
        params.insert(key.trim().to_string(), Value::from(value));
    }
    Ok(params)
}

/// Handles the start command: runs one crawl start
async fn handle_start(
    config: &Config,
    urls: String,
    user_id: Option<String>,
    options: &[String],
) -> anyhow::Result<()> {
    let mut params = parse_options(options)?;
    params.insert(CRAWLING_URL.to_string(), Value::from(urls));
    if let Some(user_id) = user_id {
        params.insert(USER_ID.to_string(), Value::from(user_id));
    }

    let ctx = CrawlStartContext::from_config(config)?;
    let starter = CrawlStarter::new(Arc::new(ctx));

    let response = starter.start(&params).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.success {
        bail!("No crawl could be started");
    }
    Ok(())
}

/// Handles the show command: prints one audit record
fn handle_show(config: &Config, crawl_id: &str) -> anyhow::Result<()> {
    let store = open_store(
        Path::new(&config.store.database_path),
        &config.store.crawlstart_index,
    )?;

    match store.get_crawlstart(crawl_id)? {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        None => bail!("No crawl start recorded with id {}", crawl_id),
    }
}

/// Handles the queues command: shows queue statistics
fn handle_queues(config: &Config) -> anyhow::Result<()> {
    println!("Store: {}", config.store.database_path);
    println!("Broker: {}\n", config.broker.database_path);

    let ctx = CrawlStartContext::from_config(config)?;
    let stats = load_statistics(&ctx)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the check command: validates config and shows the effective template
fn handle_check(config: &Config) -> anyhow::Result<()> {
    println!("=== Crawl-Starter Configuration ===\n");

    println!("Store:");
    println!("  Database: {}", config.store.database_path);
    println!("  Crawler index: {}", config.store.crawler_index);
    println!("  Crawlstart index: {}", config.store.crawlstart_index);

    println!("\nBroker:");
    println!("  Database: {}", config.broker.database_path);
    println!("  Service: {}", config.broker.service);
    println!("  Sharding: {}", config.broker.sharding()?);
    println!("  Priority dimensions: {:?}", config.broker.priority_dimensions);
    println!("  Queues: {}", config.broker.queues().join(", "));

    println!("\nOrchestrator:");
    println!(
        "  Max concurrent seeds: {}",
        config.orchestrator.max_concurrent_seeds
    );
    println!(
        "  Operation timeout: {}ms",
        config.orchestrator.operation_timeout_ms
    );

    let (template, rejected) = CrawlStartTemplate::with_overrides(&config.template);
    println!("\nTemplate ({} options):", template.len());
    for (key, value) in template.iter() {
        println!("  {} = {} ({})", key, value.to_json(), value.kind());
    }

    if !rejected.is_empty() {
        println!("\nIgnored overrides ({}):", rejected.len());
        for error in &rejected {
            println!("  - {}", error);
        }
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}
