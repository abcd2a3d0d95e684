//! Request normalization
//!
//! Merges caller parameters over a clone of the crawl-start template. Every template key is
//! present in the result and keeps the type of its default.

use crate::template::{
    CrawlStartTemplate, OptionValue, COLLECTION, CRAWLING_DEPTH, CRAWLING_URL, MUSTMATCH,
    PRIORITY,
};
use crate::OptionError;
use indexmap::IndexMap;
use regex::Regex;
use serde_json::{Map, Value};

/// Caller parameter and request key holding the user id
pub const USER_ID: &str = "userId";

/// User id recorded when the caller supplies none
pub const ANONYMOUS_USER: &str = "anonymous";

/// Deepest crawl a request may ask for
pub const MAX_CRAWLING_DEPTH: i32 = 8;

/// A crawl request after normalization
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    /// Every template option plus `userId`, in template order
    pub options: IndexMap<String, OptionValue>,
    pub user_id: String,
    /// Trimmed URL must-match pattern
    pub mustmatch: String,
    /// Collection name to URL pattern, in the caller's order
    pub collections: IndexMap<String, Regex>,
}

impl CrawlRequest {
    /// Raw value of `crawlingURL`; empty when unset
    pub fn crawling_url(&self) -> &str {
        self.options
            .get(CRAWLING_URL)
            .and_then(OptionValue::as_str)
            .unwrap_or("")
    }

    pub fn depth(&self) -> i32 {
        self.int_option(CRAWLING_DEPTH)
    }

    pub fn priority(&self) -> i32 {
        self.int_option(PRIORITY)
    }

    fn int_option(&self, key: &str) -> i32 {
        self.options
            .get(key)
            .and_then(OptionValue::as_i64)
            .and_then(|v| i32::try_from(v).ok())
            .unwrap_or(0)
    }

    pub fn collection_names(&self) -> Vec<String> {
        self.collections.keys().cloned().collect()
    }

    /// Renders the options as a flat JSON object
    pub fn to_json(&self) -> Map<String, Value> {
        self.options
            .iter()
            .map(|(key, value)| (key.clone(), value.to_json()))
            .collect()
    }
}

/// Normalizes caller parameters against a template clone
///
/// Caller keys the template does not know are ignored. A value that cannot be coerced to
/// the default's type leaves the default in place.
///
/// # Examples
///
/// ```
/// use crawl_starter::crawlstart::normalize_request;
/// use crawl_starter::CrawlStartTemplate;
/// use serde_json::json;
///
/// let params = json!({ "crawlingURL": "a.example", "crawlingDepth": 20 });
/// let request = normalize_request(params.as_object().unwrap(), CrawlStartTemplate::builtin());
/// assert_eq!(request.depth(), 8);
/// assert_eq!(request.user_id, "anonymous");
/// ```
pub fn normalize_request(
    params: &Map<String, Value>,
    template: CrawlStartTemplate,
) -> CrawlRequest {
    let mut options = template.into_options();

    for (key, default) in options.iter_mut() {
        let Some(raw) = params.get(key) else {
            continue;
        };
        if raw.is_null() {
            continue;
        }

        match default.coerce_json(raw) {
            Some(value) => *default = value,
            None => tracing::debug!(
                "Ignoring value {} for option '{}', expected {}",
                raw,
                key,
                default.kind()
            ),
        }
    }

    let user_id = params
        .get(USER_ID)
        .and_then(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| ANONYMOUS_USER.to_string());
    options.insert(USER_ID.to_string(), OptionValue::String(user_id.clone()));

    match options.get_mut(CRAWLING_DEPTH) {
        Some(OptionValue::Int(depth)) => *depth = (*depth).clamp(0, MAX_CRAWLING_DEPTH),
        Some(OptionValue::Long(depth)) => {
            *depth = (*depth).clamp(0, i64::from(MAX_CRAWLING_DEPTH))
        }
        _ => {}
    }

    let mustmatch = match options.get_mut(MUSTMATCH) {
        Some(OptionValue::String(pattern)) => {
            *pattern = pattern.trim().to_string();
            pattern.clone()
        }
        _ => ".*".to_string(),
    };

    let collection = options
        .get(COLLECTION)
        .and_then(OptionValue::as_str)
        .unwrap_or("");
    let (collections, rejected) = parse_collections(collection);
    for error in rejected {
        tracing::warn!("Dropping collection: {}", error);
    }

    CrawlRequest {
        options,
        user_id,
        mustmatch,
        collections,
    }
}

/// Parses a collection expression
///
/// The expression is a comma-separated list of `name` or `name:regex` entries; a bare
/// name matches every URL. Patterns must match the whole URL. Entries whose pattern does
/// not compile are left out and returned as errors.
///
/// # Examples
///
/// ```
/// use crawl_starter::crawlstart::parse_collections;
///
/// let (collections, rejected) = parse_collections("user, news:.*\\.example/news/.*");
/// assert_eq!(collections.keys().collect::<Vec<_>>(), vec!["user", "news"]);
/// assert!(collections["news"].is_match("http://a.example/news/1"));
/// assert!(rejected.is_empty());
/// ```
pub fn parse_collections(expression: &str) -> (IndexMap<String, Regex>, Vec<OptionError>) {
    let mut collections = IndexMap::new();
    let mut rejected = Vec::new();

    for entry in expression.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let (name, pattern) = match entry.split_once(':') {
            Some((name, pattern)) => (name.trim(), pattern.trim()),
            None => (entry, ".*"),
        };
        if name.is_empty() {
            continue;
        }

        match Regex::new(&format!("^(?:{})$", pattern)) {
            Ok(regex) => {
                collections.insert(name.to_string(), regex);
            }
            Err(source) => rejected.push(OptionError::InvalidCollectionPattern {
                name: name.to_string(),
                source,
            }),
        }
    }

    (collections, rejected)
}
