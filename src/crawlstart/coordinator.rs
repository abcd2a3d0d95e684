//! Crawl-start coordinator - per-seed publishing pipeline
//!
//! This module contains the request flow that coordinates every step of a crawl start:
//! - Normalizing the request once and splitting it into seeds
//! - Running one pipeline per seed on a bounded, order-preserving stream
//! - Persisting audit records before anything is published
//! - Collecting per-seed failures into the response

use crate::broker::BrokerError;
use crate::crawlstart::job::{ActionDescriptor, CrawlJob};
use crate::crawlstart::normalize::{normalize_request, CrawlRequest};
use crate::crawlstart::reconcile::reconcile;
use crate::crawlstart::response::{CrawlStartResponse, SeedOutcome};
use crate::crawlstart::CrawlStartContext;
use crate::url::{split_seed_urls, SeedUrl};
use crate::{SeedError, StartError};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Entry point for crawl-start requests
#[derive(Clone)]
pub struct CrawlStarter {
    ctx: Arc<CrawlStartContext>,
}

impl CrawlStarter {
    pub fn new(ctx: Arc<CrawlStartContext>) -> Self {
        Self { ctx }
    }

    /// Starts crawls for every seed URL of a request
    ///
    /// # Arguments
    ///
    /// * `params` - Caller parameters: template options plus an optional `userId`
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStartResponse)` - Per-seed results, even if every seed failed
    /// * `Err(StartError::MissingSeedUrl)` - The request names no seed URL
    pub async fn start(
        &self,
        params: &Map<String, Value>,
    ) -> Result<CrawlStartResponse, StartError> {
        self.start_at(params, Utc::now()).await
    }

    /// Like [`start`](Self::start), with an explicit request time
    pub async fn start_at(
        &self,
        params: &Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<CrawlStartResponse, StartError> {
        let request = normalize_request(params, self.ctx.template.clone());

        let seeds = split_seed_urls(request.crawling_url());
        if seeds.is_empty() {
            return Err(StartError::MissingSeedUrl);
        }

        tracing::info!(
            "Starting {} crawl(s) for user {} at depth {}",
            seeds.len(),
            request.user_id,
            request.depth()
        );

        let request = &request;
        let outcomes: Vec<SeedOutcome> = stream::iter(seeds.into_iter().enumerate())
            .map(|(ordinal, seed)| async move {
                let result = self.start_seed(request, &seed, ordinal, now).await;
                if let Err(e) = &result {
                    tracing::warn!("Error when starting crawl for {}: {}", seed, e);
                }
                SeedOutcome {
                    ordinal,
                    seed,
                    result,
                }
            })
            .buffered(self.ctx.settings.max_concurrent_seeds.max(1))
            .collect()
            .await;

        let response = CrawlStartResponse::aggregate(Value::Object(request.to_json()), outcomes);
        tracing::info!(
            "Crawl start finished: {} published, {} failed",
            response.actions.len(),
            response.failures.len()
        );

        Ok(response)
    }

    /// Runs the pipeline of one seed
    ///
    /// The audit record is written first; a failure there stops the seed before any
    /// cleanup or publishing. A failed cleanup is logged and the seed proceeds.
    async fn start_seed(
        &self,
        request: &CrawlRequest,
        raw: &str,
        ordinal: usize,
        now: DateTime<Utc>,
    ) -> Result<ActionDescriptor, SeedError> {
        let seed = SeedUrl::parse(raw).map_err(|source| SeedError::MalformedSeedUrl {
            seed: raw.to_string(),
            source,
        })?;

        let job = CrawlJob::build(request, &seed, ordinal, now);
        tracing::debug!("Built crawl job {} for {}", job.crawl_id, job.start_url);

        let record = job.record(request, now);
        self.ctx
            .with_store(move |store| store.store_crawlstart(&record))
            .await
            .map_err(|source| SeedError::AuditPersistFailure {
                crawl_id: job.crawl_id.clone(),
                source,
            })?;

        if let Err(e) = reconcile(&self.ctx, &job.start_url).await {
            tracing::warn!("{}", e);
        }

        let routing = self.ctx.settings.routing.clone();
        let host = job.host.clone();
        let priority = job.priority;
        let queue = self
            .ctx
            .with_broker(move |broker| {
                broker.queue_name(
                    &routing.service,
                    &routing.queues,
                    routing.method,
                    &routing.dimensions,
                    priority,
                    &host,
                )
            })
            .await
            .map_err(|source| SeedError::RoutingFailure {
                crawl_id: job.crawl_id.clone(),
                source,
            })?;

        let service = self.ctx.settings.routing.service.clone();
        let action = job.action(&service, &queue);
        let publish_failure = |source: BrokerError| SeedError::PublishFailure {
            crawl_id: job.crawl_id.clone(),
            queue: queue.clone(),
            source,
        };

        let payload = job
            .message(action.clone())
            .to_bytes()
            .map_err(|e| publish_failure(BrokerError::from(e)))?;

        let target = queue.clone();
        self.ctx
            .with_broker(move |broker| broker.send(&service, &target, &payload))
            .await
            .map_err(publish_failure)?;

        tracing::info!(
            "Published crawl {} for {} to queue {}",
            job.crawl_id,
            job.start_url,
            queue
        );

        Ok(action)
    }
}
