//! URL handling module for Crawl-Starter
//!
//! This module provides seed URL splitting, normalization, host extraction and
//! smart second-level domain resolution.

mod domain;
mod normalize;
mod splitter;

use crate::UrlError;

// Re-export main functions
pub use domain::{extract_domain, smart_sld};
pub use normalize::normalize_url;
pub use splitter::split_seed_urls;

/// One seed URL of a crawl request, with its derived attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedUrl {
    /// Normalized absolute form of the URL
    pub url: ::url::Url,

    /// Lowercase host, used as the shard distribution key
    pub host: String,

    /// Smart second-level domain of the host
    pub ssld: String,
}

impl SeedUrl {
    /// Parses and normalizes one seed string
    ///
    /// # Examples
    ///
    /// ```
    /// use crawl_starter::url::SeedUrl;
    ///
    /// let seed = SeedUrl::parse("www.example.com/start").unwrap();
    /// assert_eq!(seed.normal_form(), "http://www.example.com/start");
    /// assert_eq!(seed.host, "www.example.com");
    /// assert_eq!(seed.ssld, "example");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        let url = normalize_url(raw)?;
        let host = extract_domain(&url).ok_or(UrlError::MissingDomain)?;
        let ssld = smart_sld(&host);
        Ok(Self { url, host, ssld })
    }

    /// The normalized URL as a string
    pub fn normal_form(&self) -> &str {
        self.url.as_str()
    }
}
