use crate::UrlError;
use url::Url;

/// Schemes accepted for seed URLs
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Normalizes a seed URL into its canonical absolute form
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace; reject empty input
/// 2. Prepend `http://` when no scheme is given (`example.com` -> `http://example.com/`)
/// 3. Parse the URL; reject if malformed
/// 4. Accept only HTTP and HTTPS
/// 5. Require a host (the parser lowercases it and drops default ports)
/// 6. Resolve dot segments; an empty path becomes `/`
/// 7. Remove the fragment
///
/// Query strings are kept as given: they are part of the crawl start.
///
/// # Examples
///
/// ```
/// use crawl_starter::url::normalize_url;
///
/// let url = normalize_url("WWW.Example.COM/a/../b#top").unwrap();
/// assert_eq!(url.as_str(), "http://www.example.com/b");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let trimmed = url_str.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    let with_scheme = if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingDomain),
    }

    if url.cannot_be_a_base() {
        return Err(UrlError::Malformed(with_scheme));
    }

    url.set_fragment(None);

    Ok(url)
}

/// True if the string starts with `scheme://`
///
/// A `://` later in the string, such as in a query parameter, does not count.
fn has_scheme(url_str: &str) -> bool {
    let Some((scheme, _)) = url_str.split_once("://") else {
        return false;
    };

    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}
