//! Integration tests for the crawl-start orchestrator
//!
//! These tests run complete crawl starts against SQLite-backed stores and brokers,
//! with wrapper brokers and stores injecting failures where needed.

use chrono::{DateTime, Duration, TimeZone, Utc};
use crawl_starter::broker::{
    select_queue, Broker, BrokerError, BrokerResult, ShardingMethod, SqliteBroker,
};
use crawl_starter::config::load_config;
use crawl_starter::crawlstart::{
    url_fingerprint, CrawlStartContext, CrawlStartSettings, CrawlStarter, QueueMessage,
    RoutingSettings,
};
use crawl_starter::storage::{
    CrawlstartRecord, FieldQuery, IndexStore, SqliteIndexStore, StorageError, StorageResult,
};
use crawl_starter::template::CrawlStartTemplate;
use serde_json::{json, Map, Value};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tempfile::NamedTempFile;

const QUEUES: [&str; 4] = ["webcrawler_00", "webcrawler_01", "webcrawler_02", "webcrawler_03"];

/// Routing over four equal queues in one priority band
fn test_settings() -> CrawlStartSettings {
    CrawlStartSettings {
        routing: RoutingSettings {
            service: "crawler".to_string(),
            queues: QUEUES.iter().map(|q| q.to_string()).collect(),
            method: ShardingMethod::Balance,
            dimensions: vec![4],
        },
        ..CrawlStartSettings::default()
    }
}

fn create_starter(
    store: Arc<dyn IndexStore>,
    broker: Arc<dyn Broker>,
    settings: CrawlStartSettings,
) -> CrawlStarter {
    let ctx = CrawlStartContext::new(store, broker, CrawlStartTemplate::builtin(), settings);
    CrawlStarter::new(Arc::new(ctx))
}

fn params(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("params must be a JSON object")
}

fn request_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn queue_for(host: &str) -> String {
    let queues: Vec<String> = QUEUES.iter().map(|q| q.to_string()).collect();
    select_queue(&queues, ShardingMethod::Balance, &[4], 0, host).unwrap()
}

/// Two hosts that the router sends to different queues
fn hosts_on_distinct_queues() -> (String, String) {
    let first = "a.example".to_string();
    let first_queue = queue_for(&first);
    let second = (0..100)
        .map(|i| format!("host{}.example", i))
        .find(|host| queue_for(host) != first_queue)
        .expect("some host must land on another queue");
    (first, second)
}

fn total_messages(broker: &SqliteBroker) -> u64 {
    QUEUES
        .iter()
        .map(|q| broker.available("crawler", q).unwrap())
        .sum()
}

/// Broker that refuses to send the job for one start URL
struct FailingBroker {
    inner: SqliteBroker,
    fail_url: String,
}

impl Broker for FailingBroker {
    fn send(&self, service: &str, queue: &str, payload: &[u8]) -> BrokerResult<()> {
        if String::from_utf8_lossy(payload).contains(&self.fail_url) {
            return Err(BrokerError::Unavailable("connection refused".to_string()));
        }
        self.inner.send(service, queue, payload)
    }

    fn available(&self, service: &str, queue: &str) -> BrokerResult<u64> {
        self.inner.available(service, queue)
    }
}

/// Broker whose sends take longer than the operation timeout
struct SlowBroker {
    delay: StdDuration,
}

impl Broker for SlowBroker {
    fn send(&self, _service: &str, _queue: &str, _payload: &[u8]) -> BrokerResult<()> {
        std::thread::sleep(self.delay);
        Ok(())
    }

    fn available(&self, _service: &str, _queue: &str) -> BrokerResult<u64> {
        Ok(0)
    }
}

/// Store that cannot persist audit records
struct ReadOnlyStore {
    inner: SqliteIndexStore,
}

impl IndexStore for ReadOnlyStore {
    fn put_document(&self, index: &str, id: &str, body: &Value) -> StorageResult<()> {
        self.inner.put_document(index, id, body)
    }

    fn delete(&self, index: &str, query: &FieldQuery) -> StorageResult<u64> {
        self.inner.delete(index, query)
    }

    fn count(&self, index: &str, query: Option<&FieldQuery>) -> StorageResult<u64> {
        self.inner.count(index, query)
    }

    fn store_crawlstart(&self, _record: &CrawlstartRecord) -> StorageResult<()> {
        Err(StorageError::Database("attempt to write a readonly database".to_string()))
    }

    fn get_crawlstart(&self, crawl_id: &str) -> StorageResult<Option<CrawlstartRecord>> {
        self.inner.get_crawlstart(crawl_id)
    }

    fn count_crawlstarts(&self) -> StorageResult<u64> {
        self.inner.count_crawlstarts()
    }
}

/// Store whose tracking-index deletes always fail
struct UndeletableStore {
    inner: SqliteIndexStore,
}

impl IndexStore for UndeletableStore {
    fn put_document(&self, index: &str, id: &str, body: &Value) -> StorageResult<()> {
        self.inner.put_document(index, id, body)
    }

    fn delete(&self, _index: &str, _query: &FieldQuery) -> StorageResult<u64> {
        Err(StorageError::Database("database is locked".to_string()))
    }

    fn count(&self, index: &str, query: Option<&FieldQuery>) -> StorageResult<u64> {
        self.inner.count(index, query)
    }

    fn store_crawlstart(&self, record: &CrawlstartRecord) -> StorageResult<()> {
        self.inner.store_crawlstart(record)
    }

    fn get_crawlstart(&self, crawl_id: &str) -> StorageResult<Option<CrawlstartRecord>> {
        self.inner.get_crawlstart(crawl_id)
    }

    fn count_crawlstarts(&self) -> StorageResult<u64> {
        self.inner.count_crawlstarts()
    }
}

#[tokio::test]
async fn test_single_seed_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("crawlstart.db");

    let mut config_file = NamedTempFile::new().unwrap();
    write!(
        config_file,
        r#"
[store]
database-path = "{db}"

[broker]
database-path = "{db}"
source-queues = ["webcrawler_00", "webcrawler_01"]
priority-dimensions = [2]

[template]
crawlingDepth = 2
"#,
        db = db_path.display()
    )
    .unwrap();
    config_file.flush().unwrap();

    let config = load_config(config_file.path()).unwrap();
    let starter = CrawlStarter::new(Arc::new(CrawlStartContext::from_config(&config).unwrap()));

    let response = starter
        .start_at(
            &params(json!({ "crawlingURL": "www.example.co.uk", "userId": "alice" })),
            request_time(),
        )
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.comment, None);
    assert_eq!(response.actions.len(), 1);
    assert_eq!(response.data[0]["crawlingDepth"], json!(2));
    assert_eq!(response.data[0]["userId"], json!("alice"));

    let action = &response.actions[0];
    assert_eq!(action.kind, "crawler");
    assert_eq!(action.user_id, "alice");
    assert_eq!(action.assets.rootasset[0].canonical_s, "http://www.example.co.uk/");
    assert!(action.id.starts_with("www.example.co.uk-"));

    // the audit record is readable through a second handle on the same file
    let store = SqliteIndexStore::new(&db_path).unwrap();
    let record = store.get_crawlstart(&action.id).unwrap().unwrap();
    assert_eq!(record.user_id, "alice");
    assert_eq!(record.start_url, "http://www.example.co.uk/");
    assert_eq!(record.start_ssld, "example");
    assert_eq!(record.collections, vec!["user".to_string()]);
    assert_eq!(record.init_date, request_time());
    assert_eq!(record.data["id"], json!(action.id));

    let broker = SqliteBroker::new(&db_path).unwrap();
    let payloads = broker.peek("crawler", &action.queue, 10).unwrap();
    assert_eq!(payloads.len(), 1);

    let message: QueueMessage = serde_json::from_slice(&payloads[0]).unwrap();
    assert_eq!(message.actions, vec![action.clone()]);
    assert_eq!(message.data.len(), 1);
    assert_eq!(message.data[0]["start_url"], json!("http://www.example.co.uk/"));
    assert_eq!(message.data[0]["start_ssld"], json!("example"));
}

#[tokio::test]
async fn test_two_seeds_depth_clamped() {
    let store = Arc::new(SqliteIndexStore::open_in_memory().unwrap());
    let broker = Arc::new(SqliteBroker::open_in_memory().unwrap());
    let starter = create_starter(store.clone(), broker.clone(), test_settings());
    let (first, second) = hosts_on_distinct_queues();

    let response = starter
        .start_at(
            &params(json!({
                "crawlingURL": format!("{},{}", first, second),
                "crawlingDepth": 20,
            })),
            request_time(),
        )
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.data[0]["crawlingDepth"], json!(8));
    assert_eq!(response.actions.len(), 2);
    assert_ne!(response.actions[0].id, response.actions[1].id);
    assert_ne!(response.actions[0].queue, response.actions[1].queue);
    assert_eq!(response.actions[0].queue, queue_for(&first));
    assert_eq!(response.actions[1].queue, queue_for(&second));

    for action in &response.actions {
        let record = store.get_crawlstart(&action.id).unwrap().unwrap();
        assert_eq!(record.data["crawlingDepth"], json!(8));
    }
    assert_eq!(total_messages(&broker), 2);
}

#[tokio::test]
async fn test_malformed_seed_does_not_affect_others() {
    let store = Arc::new(SqliteIndexStore::open_in_memory().unwrap());
    let broker = Arc::new(SqliteBroker::open_in_memory().unwrap());
    let starter = create_starter(store.clone(), broker.clone(), test_settings());

    let response = starter
        .start_at(
            &params(json!({ "crawlingURL": "a.example\nhttp://\nc.example" })),
            request_time(),
        )
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.actions.len(), 2);
    assert_eq!(response.failures.len(), 1);
    assert_eq!(response.failures[0].ordinal, 1);
    assert_eq!(response.failures[0].seed, "http://");
    assert!(response.comment.is_some());

    assert_eq!(store.count_crawlstarts().unwrap(), 2);
    assert_eq!(total_messages(&broker), 2);
}

#[tokio::test]
async fn test_publish_failure_keeps_audit_record() {
    let store = Arc::new(SqliteIndexStore::open_in_memory().unwrap());
    let broker = Arc::new(FailingBroker {
        inner: SqliteBroker::open_in_memory().unwrap(),
        fail_url: "http://b.example/".to_string(),
    });
    let starter = create_starter(store.clone(), broker.clone(), test_settings());

    let response = starter
        .start_at(
            &params(json!({ "crawlingURL": "a.example,b.example" })),
            request_time(),
        )
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.actions.len(), 1);
    assert_eq!(
        response.actions[0].assets.rootasset[0].canonical_s,
        "http://a.example/"
    );

    let comment = response.comment.expect("failed seed must set a comment");
    assert!(comment.contains("connection refused"), "comment: {}", comment);
    assert_eq!(response.failures[0].seed, "b.example");

    // both seeds were recorded before publishing; only one was enqueued
    assert_eq!(store.count_crawlstarts().unwrap(), 2);
    assert_eq!(total_messages(&broker.inner), 1);
}

#[tokio::test]
async fn test_audit_failure_stops_seed_before_publishing() {
    let store = Arc::new(ReadOnlyStore {
        inner: SqliteIndexStore::open_in_memory().unwrap(),
    });
    let broker = Arc::new(SqliteBroker::open_in_memory().unwrap());
    let starter = create_starter(store, broker.clone(), test_settings());

    let response = starter
        .start_at(&params(json!({ "crawlingURL": "a.example" })), request_time())
        .await
        .unwrap();

    assert!(!response.success);
    assert!(response.actions.is_empty());
    assert!(response
        .comment
        .as_deref()
        .unwrap_or("")
        .contains("readonly"));
    assert_eq!(total_messages(&broker), 0);
}

#[tokio::test]
async fn test_slow_broker_times_out() {
    let store = Arc::new(SqliteIndexStore::open_in_memory().unwrap());
    let broker = Arc::new(SlowBroker {
        delay: StdDuration::from_millis(500),
    });
    let settings = CrawlStartSettings {
        operation_timeout: StdDuration::from_millis(100),
        ..test_settings()
    };
    let starter = create_starter(store.clone(), broker, settings);

    let response = starter
        .start_at(&params(json!({ "crawlingURL": "a.example" })), request_time())
        .await
        .unwrap();

    assert!(!response.success);
    assert!(response
        .comment
        .as_deref()
        .unwrap_or("")
        .contains("timed out after 100ms; it may still have completed"));
    assert_eq!(store.count_crawlstarts().unwrap(), 1);
}

#[tokio::test]
async fn test_restarting_a_url_never_touches_earlier_records() {
    let store = Arc::new(SqliteIndexStore::open_in_memory().unwrap());
    let broker = Arc::new(SqliteBroker::open_in_memory().unwrap());
    let starter = create_starter(store.clone(), broker.clone(), test_settings());
    let request = params(json!({ "crawlingURL": "a.example", "userId": "alice" }));

    let first = starter.start_at(&request, request_time()).await.unwrap();
    let first_id = first.actions[0].id.clone();
    let first_record = store.get_crawlstart(&first_id).unwrap().unwrap();

    let later = request_time() + Duration::minutes(5);
    let second = starter
        .start_at(&params(json!({ "crawlingURL": "a.example", "userId": "bob" })), later)
        .await
        .unwrap();

    assert_ne!(second.actions[0].id, first_id);
    assert_eq!(store.count_crawlstarts().unwrap(), 2);
    assert_eq!(store.get_crawlstart(&first_id).unwrap(), Some(first_record));

    // the audit index cannot be cleared through the tracking-index API
    let delete = store.delete("crawlstart", &FieldQuery::id(first_id.as_str()));
    assert!(matches!(delete, Err(StorageError::ImmutableIndex(_))));
}

#[tokio::test]
async fn test_stale_tracking_entries_cleared_once() {
    let store = Arc::new(SqliteIndexStore::open_in_memory().unwrap());
    let broker = Arc::new(SqliteBroker::open_in_memory().unwrap());
    let starter = create_starter(store.clone(), broker.clone(), test_settings());
    let start_url = "http://a.example/";

    store
        .put_document("crawler", &url_fingerprint(start_url), &json!({ "url": start_url }))
        .unwrap();
    store
        .put_document("crawler", "page-1", &json!({ "start_url": start_url }))
        .unwrap();
    store
        .put_document("crawler", "unrelated", &json!({ "start_url": "http://b.example/" }))
        .unwrap();

    let request = params(json!({ "crawlingURL": "a.example" }));
    starter.start_at(&request, request_time()).await.unwrap();
    assert_eq!(store.count("crawler", None).unwrap(), 1);

    let later = request_time() + Duration::seconds(1);
    let response = starter.start_at(&request, later).await.unwrap();
    assert!(response.success);
    assert_eq!(store.count("crawler", None).unwrap(), 1);
    assert_eq!(total_messages(&broker), 2);
}

#[tokio::test]
async fn test_many_seeds_keep_order() {
    let store = Arc::new(SqliteIndexStore::open_in_memory().unwrap());
    let broker = Arc::new(SqliteBroker::open_in_memory().unwrap());
    let settings = CrawlStartSettings {
        max_concurrent_seeds: 3,
        ..test_settings()
    };
    let starter = create_starter(store.clone(), broker.clone(), settings);

    let hosts: Vec<String> = (0..10).map(|i| format!("site{}.example", i)).collect();
    let response = starter
        .start_at(&params(json!({ "crawlingURL": hosts.join(" ") })), request_time())
        .await
        .unwrap();

    let started: Vec<String> = response
        .actions
        .iter()
        .map(|a| a.assets.rootasset[0].canonical_s.clone())
        .collect();
    let expected: Vec<String> = hosts.iter().map(|h| format!("http://{}/", h)).collect();
    assert_eq!(started, expected);

    for (ordinal, action) in response.actions.iter().enumerate() {
        assert!(action.id.ends_with(&format!("-{}", ordinal)));
    }
    assert_eq!(store.count_crawlstarts().unwrap(), 10);
    assert_eq!(total_messages(&broker), 10);
}

#[tokio::test]
async fn test_cleanup_failure_still_publishes() {
    let store = Arc::new(UndeletableStore {
        inner: SqliteIndexStore::open_in_memory().unwrap(),
    });
    let broker = Arc::new(SqliteBroker::open_in_memory().unwrap());
    let starter = create_starter(store.clone(), broker.clone(), test_settings());

    store
        .put_document("crawler", "page-1", &json!({ "start_url": "http://a.example/" }))
        .unwrap();

    let response = starter
        .start_at(&params(json!({ "crawlingURL": "a.example" })), request_time())
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.actions.len(), 1);
    assert!(response.failures.is_empty());
    assert_eq!(response.comment, None);

    // the stale entry is still there, the job went out anyway
    assert_eq!(store.count("crawler", None).unwrap(), 1);
    assert_eq!(store.count_crawlstarts().unwrap(), 1);
    assert_eq!(total_messages(&broker), 1);
}

#[tokio::test]
async fn test_encoded_space_in_seed_starts_one_crawl() {
    let store = Arc::new(SqliteIndexStore::open_in_memory().unwrap());
    let broker = Arc::new(SqliteBroker::open_in_memory().unwrap());
    let starter = create_starter(store.clone(), broker.clone(), test_settings());

    let response = starter
        .start_at(
            &params(json!({ "crawlingURL": "http://a.example/my%20doc.pdf" })),
            request_time(),
        )
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.actions.len(), 1);
    assert_eq!(
        response.actions[0].assets.rootasset[0].canonical_s,
        "http://a.example/my%20doc.pdf"
    );
    assert_eq!(store.count_crawlstarts().unwrap(), 1);
    assert_eq!(total_messages(&broker), 1);
}

#[tokio::test]
async fn test_seed_without_scheme_may_carry_url_in_query() {
    let store = Arc::new(SqliteIndexStore::open_in_memory().unwrap());
    let broker = Arc::new(SqliteBroker::open_in_memory().unwrap());
    let starter = create_starter(store, broker, test_settings());

    let response = starter
        .start_at(
            &params(json!({ "crawlingURL": "a.example/go?to=http://b.example" })),
            request_time(),
        )
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.comment, None);
    assert_eq!(
        response.actions[0].assets.rootasset[0].canonical_s,
        "http://a.example/go?to=http://b.example"
    );
    assert!(response.actions[0].id.starts_with("a.example-"));
}
