//! Statistics about published crawl jobs
//!
//! This module provides functionality for extracting and displaying queue and audit
//! statistics from the store and broker.

use crate::crawlstart::CrawlStartContext;
use crate::StartError;

/// Queue and audit statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStatistics {
    /// Service the queues belong to
    pub service: String,

    /// Waiting messages per configured queue, in configuration order
    pub queues: Vec<(String, u64)>,

    /// Number of crawl-start audit records
    pub crawlstart_records: u64,

    /// Number of documents in the crawler tracking index
    pub tracking_entries: u64,
}

impl QueueStatistics {
    pub fn total_messages(&self) -> u64 {
        self.queues.iter().map(|(_, count)| count).sum()
    }
}

/// Loads statistics for the configured service
///
/// # Arguments
///
/// * `ctx` - The context whose store and broker are queried
///
/// # Returns
///
/// * `Ok(QueueStatistics)` - Successfully loaded statistics
/// * `Err(StartError)` - Failed to query the store or broker
pub fn load_statistics(ctx: &CrawlStartContext) -> Result<QueueStatistics, StartError> {
    let service = ctx.settings.routing.service.clone();

    let mut queues = Vec::with_capacity(ctx.settings.routing.queues.len());
    for queue in &ctx.settings.routing.queues {
        let count = ctx.broker.available(&service, queue)?;
        queues.push((queue.clone(), count));
    }

    let crawlstart_records = ctx.store.count_crawlstarts()?;
    let tracking_entries = ctx.store.count(&ctx.settings.crawler_index, None)?;

    Ok(QueueStatistics {
        service,
        queues,
        crawlstart_records,
        tracking_entries,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &QueueStatistics) {
    println!("=== Crawl Queue Statistics ===\n");

    println!("Overview:");
    println!("  Service: {}", stats.service);
    println!("  Crawl starts recorded: {}", stats.crawlstart_records);
    println!("  Tracking entries: {}", stats.tracking_entries);
    println!("  Waiting messages: {}", stats.total_messages());
    println!();

    println!("Queues:");
    let total = stats.total_messages();
    for (queue, count) in &stats.queues {
        let percentage = if total > 0 {
            (*count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", queue, count, percentage);
    }
}
