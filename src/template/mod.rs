//! Crawl-start template
//!
//! The template is the canonical set of crawl-start options together with their typed
//! default values. It is built once at start-up (built-in defaults plus the optional
//! `[template]` table of the configuration) and cloned for every incoming request.

mod value;

pub use value::{OptionKind, OptionValue};

use crate::OptionError;
use indexmap::IndexMap;

/// Name of the option carrying the seed URL(s)
pub const CRAWLING_URL: &str = "crawlingURL";
/// Name of the option carrying the crawl depth
pub const CRAWLING_DEPTH: &str = "crawlingDepth";
/// Name of the option carrying the URL must-match pattern
pub const MUSTMATCH: &str = "mustmatch";
/// Name of the option carrying the collection filter expression
pub const COLLECTION: &str = "collection";
/// Name of the option carrying the job priority
pub const PRIORITY: &str = "priority";

/// Ordered mapping from option name to typed default value
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStartTemplate {
    options: IndexMap<String, OptionValue>,
}

impl CrawlStartTemplate {
    /// Returns the built-in crawl-start defaults
    pub fn builtin() -> Self {
        let mut options = IndexMap::new();
        let mut put = |key: &str, value: OptionValue| {
            options.insert(key.to_string(), value);
        };

        put("crawlingMode", "url".into());
        put(CRAWLING_URL, "".into());
        put("sitemapURL", "".into());
        put("crawlingFile", "".into());
        put(CRAWLING_DEPTH, OptionValue::Int(3));
        put("crawlingDepthExtension", "".into());
        put("range", "domain".into());
        put(MUSTMATCH, ".*".into());
        put("mustnotmatch", "".into());
        put("ipMustmatch", ".*".into());
        put("ipMustnotmatch", "".into());
        put("indexmustmatch", ".*".into());
        put("indexmustnotmatch", "".into());
        put("deleteold", "off".into());
        put("deleteIfOlderNumber", OptionValue::Long(0));
        put("deleteIfOlderUnit", "day".into());
        put("recrawl", "nodoubles".into());
        put("reloadIfOlderNumber", OptionValue::Long(0));
        put("reloadIfOlderUnit", "day".into());
        put("crawlingDomMaxCheck", "off".into());
        put("crawlingDomMaxPages", OptionValue::Int(1000));
        put("crawlingQ", "off".into());
        put("cachePolicy", "if fresh".into());
        put(COLLECTION, "user".into());
        put("agentName", "".into());
        put(PRIORITY, OptionValue::Int(0));
        put("loaderHeadless", "false".into());
        put("storeAssets", "false".into());
        put("archiveWARC", "false".into());
        put("archiveIndex", "false".into());
        put("archiveGraph", "false".into());
        put("ignoreClassName", OptionValue::StringList(Vec::new()));

        Self { options }
    }

    /// Builds a template from the built-in defaults and configured overrides
    ///
    /// Overrides that cannot be represented are skipped and returned alongside the
    /// template; the built-in default stays in place for those keys.
    pub fn with_overrides(overrides: &toml::Table) -> (Self, Vec<OptionError>) {
        let mut template = Self::builtin();
        let mut rejected = Vec::new();

        for (key, value) in overrides {
            let converted = match template.options.get(key) {
                Some(default) => default.coerce_toml(value).ok_or_else(|| {
                    if OptionValue::from_toml(value).is_some() {
                        OptionError::TypeMismatch {
                            key: key.clone(),
                            expected: default.kind().name(),
                            found: value.type_str().to_string(),
                        }
                    } else {
                        OptionError::UnrecognizedOptionType {
                            key: key.clone(),
                            found: value.type_str().to_string(),
                        }
                    }
                }),
                None => OptionValue::from_toml(value).ok_or_else(|| {
                    OptionError::UnrecognizedOptionType {
                        key: key.clone(),
                        found: value.type_str().to_string(),
                    }
                }),
            };

            match converted {
                Ok(v) => {
                    template.options.insert(key.clone(), v);
                }
                Err(e) => rejected.push(e),
            }
        }

        (template, rejected)
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.options.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.options.iter()
    }

    /// Consumes the template, yielding the ordered option map
    pub fn into_options(self) -> IndexMap<String, OptionValue> {
        self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

impl Default for CrawlStartTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}
