//! Aggregation of per-seed results into one response

use crate::crawlstart::job::ActionDescriptor;
use crate::SeedError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of one seed pipeline
#[derive(Debug)]
pub struct SeedOutcome {
    pub ordinal: usize,
    /// The seed as the caller wrote it
    pub seed: String,
    pub result: Result<ActionDescriptor, SeedError>,
}

/// A seed that could not be started
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedFailure {
    pub seed: String,
    pub ordinal: usize,
    pub error: String,
}

/// Response to a crawl-start request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlStartResponse {
    /// The normalized request, echoed once
    pub data: Vec<Value>,
    /// One action per published seed, in seed order
    pub actions: Vec<ActionDescriptor>,
    /// Whether at least one seed was published
    pub success: bool,
    /// Message of the last seed failure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SeedFailure>,
}

impl CrawlStartResponse {
    /// Folds seed outcomes into a response
    ///
    /// Outcomes are ordered by ordinal first, so the result does not depend on the order
    /// in which seeds finished.
    pub fn aggregate(request: Value, mut outcomes: Vec<SeedOutcome>) -> Self {
        outcomes.sort_by_key(|o| o.ordinal);

        let mut actions = Vec::new();
        let mut failures = Vec::new();

        for outcome in outcomes {
            match outcome.result {
                Ok(action) => actions.push(action),
                Err(e) => failures.push(SeedFailure {
                    seed: outcome.seed,
                    ordinal: outcome.ordinal,
                    error: e.to_string(),
                }),
            }
        }

        Self {
            data: vec![request],
            success: !actions.is_empty(),
            comment: failures.last().map(|f| f.error.clone()),
            actions,
            failures,
        }
    }
}
