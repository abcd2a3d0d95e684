use crate::url::SeedUrl;
use chrono::{DateTime, Utc};

/// Longest host prefix kept in a crawl id
const MAX_HOST_CHARS: usize = 80;

/// Builds the crawl id of a seed
///
/// The id is `<host>-<md5 prefix>-<timestamp>-<ordinal>`: the host truncated to 80
/// characters, the first 16 hex digits of the MD5 of the normalized URL, the request
/// time as `yyyyMMddHHmmssSSS` in UTC, and the seed's position in the request.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use crawl_starter::crawlstart::crawl_id;
/// use crawl_starter::SeedUrl;
///
/// let seed = SeedUrl::parse("a.example").unwrap();
/// let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
/// let id = crawl_id(&seed, now, 0);
/// assert!(id.starts_with("a.example-"));
/// assert!(id.ends_with("-20240501123000000-0"));
/// ```
pub fn crawl_id(seed: &SeedUrl, timestamp: DateTime<Utc>, ordinal: usize) -> String {
    let host: String = seed.host.chars().take(MAX_HOST_CHARS).collect();
    let digest = url_fingerprint(seed.normal_form());

    format!(
        "{}-{}-{}-{}",
        host,
        &digest[..16],
        timestamp.format("%Y%m%d%H%M%S%3f"),
        ordinal
    )
}

/// MD5 hex digest of a normalized URL, the id of its crawler tracking document
pub fn url_fingerprint(url: &str) -> String {
    format!("{:x}", md5::compute(url.as_bytes()))
}
