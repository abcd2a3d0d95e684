use std::net::IpAddr;
use url::Url;

/// Two-label public suffixes under which registrations happen one level deeper
const SECOND_LEVEL_SUFFIXES: &[&str] = &[
    "ac.uk", "co.uk", "gov.uk", "ltd.uk", "me.uk", "net.uk", "org.uk", "plc.uk", "sch.uk",
    "com.au", "edu.au", "gov.au", "net.au", "org.au", "co.nz", "net.nz", "org.nz", "co.jp",
    "ne.jp", "or.jp", "ac.jp", "co.kr", "or.kr", "com.br", "net.br", "org.br", "com.cn",
    "net.cn", "org.cn", "com.mx", "com.tr", "com.tw", "co.in", "co.za", "com.ar", "com.sg",
];

/// Extracts the host from a URL
///
/// The host is returned in lowercase. URLs without a host yield `None`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use crawl_starter::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the smart second-level domain of a host
///
/// This is the registrable name without its public suffix, used to group hosts that belong
/// to the same organization. IP literals and single-label hosts are returned unchanged.
///
/// # Examples
///
/// ```
/// use crawl_starter::url::smart_sld;
///
/// assert_eq!(smart_sld("www.example.net"), "example");
/// assert_eq!(smart_sld("news.bbc.co.uk"), "bbc");
/// assert_eq!(smart_sld("localhost"), "localhost");
/// ```
pub fn smart_sld(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    let bare = host.trim_start_matches('[').trim_end_matches(']');

    if bare.parse::<IpAddr>().is_ok() {
        return host;
    }

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() < 2 {
        return host;
    }

    let last_two = labels[labels.len() - 2..].join(".");
    let suffix_labels = if labels.len() > 2 && SECOND_LEVEL_SUFFIXES.contains(&last_two.as_str())
    {
        2
    } else {
        1
    };

    labels[labels.len() - suffix_labels - 1].to_string()
}
