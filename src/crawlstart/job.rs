//! Crawl jobs and the messages that carry them

use crate::crawlstart::identity::crawl_id;
use crate::crawlstart::normalize::CrawlRequest;
use crate::storage::CrawlstartRecord;
use crate::url::SeedUrl;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Graph name of the asset list carried by a crawl action
pub const ROOT_ASSET: &str = "rootasset";

/// One seed's crawl: the normalized request with its own identity
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlJob {
    pub crawl_id: String,
    pub start_url: String,
    pub start_ssld: String,
    /// Distribution key for shard routing
    pub host: String,
    pub user_id: String,
    pub priority: i32,
    /// Request options with `id`, `start_url` and `start_ssld` set
    pub body: Map<String, Value>,
}

impl CrawlJob {
    pub fn build(
        request: &CrawlRequest,
        seed: &SeedUrl,
        ordinal: usize,
        now: DateTime<Utc>,
    ) -> Self {
        let crawl_id = crawl_id(seed, now, ordinal);
        let start_url = seed.normal_form().to_string();

        let mut body = request.to_json();
        body.insert("id".to_string(), Value::from(crawl_id.as_str()));
        body.insert("start_url".to_string(), Value::from(start_url.as_str()));
        body.insert("start_ssld".to_string(), Value::from(seed.ssld.as_str()));

        Self {
            crawl_id,
            start_url,
            start_ssld: seed.ssld.clone(),
            host: seed.host.clone(),
            user_id: request.user_id.clone(),
            priority: request.priority(),
            body,
        }
    }

    /// The audit record for this job
    pub fn record(&self, request: &CrawlRequest, now: DateTime<Utc>) -> CrawlstartRecord {
        CrawlstartRecord {
            crawl_id: self.crawl_id.clone(),
            user_id: self.user_id.clone(),
            mustmatch: request.mustmatch.clone(),
            collections: request.collection_names(),
            start_url: self.start_url.clone(),
            start_ssld: self.start_ssld.clone(),
            init_date: now,
            data: Value::Object(self.body.clone()),
        }
    }

    /// The action telling a worker of `service` to crawl this job from `queue`
    pub fn action(&self, service: &str, queue: &str) -> ActionDescriptor {
        ActionDescriptor {
            kind: service.to_string(),
            queue: queue.to_string(),
            id: self.crawl_id.clone(),
            user_id: self.user_id.clone(),
            depth: 0,
            sourcegraph: ROOT_ASSET.to_string(),
            assets: Assets {
                rootasset: vec![RootAsset {
                    canonical_s: self.start_url.clone(),
                }],
            },
        }
    }

    /// Wraps the job and its action into a broker message
    pub fn message(&self, action: ActionDescriptor) -> QueueMessage {
        QueueMessage {
            data: vec![Value::Object(self.body.clone())],
            actions: vec![action],
        }
    }
}

/// Instruction for a crawler worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub queue: String,
    pub id: String,
    pub user_id: String,
    pub depth: u32,
    pub sourcegraph: String,
    pub assets: Assets,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assets {
    pub rootasset: Vec<RootAsset>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootAsset {
    pub canonical_s: String,
}

/// Payload published to the broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub data: Vec<Value>,
    pub actions: Vec<ActionDescriptor>,
}

impl QueueMessage {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
