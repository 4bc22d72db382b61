//! Discovery result types
//!
//! These are the values handed back to callers and serialized by the output
//! handlers. Optional fields that are absent are left out of the encodings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A URL listed by one of the site's sitemaps
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SitemapUrlRecord {
    pub loc: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub changefreq: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,

    /// Short page description, truncated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
}

impl SitemapUrlRecord {
    pub fn new(loc: impl Into<String>) -> Self {
        Self {
            loc: loc.into(),
            ..Self::default()
        }
    }
}

/// A page visited by the fallback crawl
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CrawlPageRecord {
    pub loc: String,

    /// Status of the final response, absent when no response arrived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One discovered URL
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum UrlRecord {
    Sitemap(SitemapUrlRecord),
    Crawled(CrawlPageRecord),
}

impl UrlRecord {
    pub fn loc(&self) -> &str {
        match self {
            Self::Sitemap(record) => &record.loc,
            Self::Crawled(record) => &record.loc,
        }
    }

    /// The fields this record carries, in declaration order, absent
    /// optional fields left out
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("loc", self.loc().to_string())];
        let mut push = |name: &'static str, value: Option<String>| {
            if let Some(v) = value {
                fields.push((name, v));
            }
        };

        match self {
            Self::Sitemap(record) => {
                push("lastmod", record.lastmod.clone());
                push("changefreq", record.changefreq.clone());
                push("priority", record.priority.map(|p| p.to_string()));
                push("meta_description", record.meta_description.clone());
            }
            Self::Crawled(record) => {
                push("status_code", record.status_code.map(|c| c.to_string()));
                push("meta_description", record.meta_description.clone());
                push("error", record.error.clone());
            }
        }

        fields
    }
}

impl From<SitemapUrlRecord> for UrlRecord {
    fn from(record: SitemapUrlRecord) -> Self {
        Self::Sitemap(record)
    }
}

impl From<CrawlPageRecord> for UrlRecord {
    fn from(record: CrawlPageRecord) -> Self {
        Self::Crawled(record)
    }
}

/// How the URLs of a discovery were obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    /// Read from the site's own sitemaps
    ExistingSitemap,
    /// Produced by the fallback crawl
    Generated,
}

impl std::fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExistingSitemap => write!(f, "existing_sitemap"),
            Self::Generated => write!(f, "generated"),
        }
    }
}

/// Outcome of one discovery operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryResult {
    pub success: bool,

    /// Absent when the discovery failed before a method was chosen
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<DiscoveryMethod>,

    pub url_count: usize,
    pub urls: Vec<UrlRecord>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall-clock duration in seconds
    pub elapsed_time: f64,
}

impl DiscoveryResult {
    /// A successful discovery
    pub fn succeeded(method: DiscoveryMethod, urls: Vec<UrlRecord>, elapsed: Duration) -> Self {
        Self {
            success: true,
            method: Some(method),
            url_count: urls.len(),
            urls,
            error: None,
            elapsed_time: elapsed.as_secs_f64(),
        }
    }

    /// A failed discovery, keeping whatever URLs were collected before it
    pub fn failed(
        error: impl Into<String>,
        method: Option<DiscoveryMethod>,
        urls: Vec<UrlRecord>,
        elapsed: Duration,
    ) -> Self {
        Self {
            success: false,
            method,
            url_count: urls.len(),
            urls,
            error: Some(error.into()),
            elapsed_time: elapsed.as_secs_f64(),
        }
    }
}
