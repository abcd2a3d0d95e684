//! Stale-state cleanup
//!
//! Tracking entries left by an earlier crawl of the same start URL would make the new
//! crawl's double-check treat its start page as already seen. They are deleted before the
//! job is published. Nothing is created here; workers write tracking entries themselves.

use crate::crawlstart::identity::url_fingerprint;
use crate::crawlstart::CrawlStartContext;
use crate::storage::{FieldQuery, StorageError};
use crate::SeedError;
use serde_json::json;

/// Number of tracking entries removed for one start URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub by_id: u64,
    pub by_start_url: u64,
}

impl CleanupReport {
    pub fn total(&self) -> u64 {
        self.by_id + self.by_start_url
    }
}

/// Deletes crawler tracking entries of `start_url`
///
/// Two deletions run against the crawler index: the document whose id is the URL
/// fingerprint, then every document whose `start_url` equals the URL. Running it again
/// deletes nothing.
pub async fn reconcile(
    ctx: &CrawlStartContext,
    start_url: &str,
) -> Result<CleanupReport, SeedError> {
    let cleanup_failure = |source: StorageError| SeedError::CleanupFailure {
        url: start_url.to_string(),
        source,
    };

    let by_id_query = FieldQuery::from_json(&json!({ "_id": url_fingerprint(start_url) }))
        .map_err(cleanup_failure)?;
    let by_url_query = FieldQuery::from_json(&json!({ "start_url.keyword": start_url }))
        .map_err(cleanup_failure)?;

    let index = ctx.settings.crawler_index.clone();
    let by_id = ctx
        .with_store(move |store| store.delete(&index, &by_id_query))
        .await
        .map_err(cleanup_failure)?;
    tracing::info!("Deleted {} old crawl index entries for _id of {}", by_id, start_url);

    let index = ctx.settings.crawler_index.clone();
    let by_start_url = ctx
        .with_store(move |store| store.delete(&index, &by_url_query))
        .await
        .map_err(cleanup_failure)?;
    tracing::info!(
        "Deleted {} old crawl index entries for start_url {}",
        by_start_url,
        start_url
    );

    Ok(CleanupReport {
        by_id,
        by_start_url,
    })
}
