/// Percent-encoded line breaks and pipes that callers pass through query strings
///
/// Encoded spaces and commas are left alone: they occur inside valid URLs.
const ENCODED_SEPARATORS: &[&str] = &[
    "%0D%0A", "%0d%0a", "%0A", "%0a", "%0D", "%0d", "%7C", "%7c",
];

/// Literal separators between seed URLs
const SEPARATORS: &[char] = &['\n', '\r', ' ', '\t', ',', '|'];

/// Splits a `crawlingURL` value into individual seed URL strings
///
/// Seeds may be separated by newlines, spaces, tabs, commas or `|`, or by percent-encoded
/// newlines and pipes. Empty fragments are skipped and the caller's
/// order is preserved. The strings are returned as given; parsing happens per seed so that
/// one malformed entry cannot reject the others.
///
/// # Examples
///
/// ```
/// use crawl_starter::url::split_seed_urls;
///
/// assert_eq!(
///     split_seed_urls("a.example,b.example"),
///     vec!["a.example".to_string(), "b.example".to_string()]
/// );
/// ```
pub fn split_seed_urls(crawling_url: &str) -> Vec<String> {
    let mut decoded = crawling_url.to_string();
    for encoded in ENCODED_SEPARATORS {
        decoded = decoded.replace(encoded, "\n");
    }

    decoded
        .split(SEPARATORS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
