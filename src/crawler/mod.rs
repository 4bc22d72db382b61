//! Crawler module for governed fetching and discovery
//!
//! This module contains the core discovery logic, including:
//! - The per-domain rate governor and its worker pool
//! - HTTP fetching with retry logic and content decoding
//! - HTML parsing and link extraction
//! - The fallback crawler
//! - Overall discovery coordination

mod content;
mod coordinator;
mod fallback;
mod fetcher;
mod governor;
mod parser;
mod pool;
mod retry;

pub use content::{
    charset_of, correct_content_type, decode_body, decode_text, detect_compression, strip_bom,
    Compression, ContentError, DecodedBody,
};
pub use coordinator::{dedup_records, parse_base_url, Coordinator, Stage};
pub use fallback::{CrawlReport, FallbackCrawler, RobotsFilter};
pub use fetcher::{build_http_client, FetchClient, FetchConfig, FetchResult};
pub use governor::{Governor, GovernorConfig};
pub use parser::{
    extract_meta_description, extract_sitemap_anchors, parse_html, resolve_link,
    truncate_description, ParsedPage,
};
pub use pool::WorkerPool;
pub use retry::{retry_delay, retry_policy, FetchErrorKind, GovernorSignal, RetryDecision};

use crate::config::Config;
use crate::output::DiscoveryResult;
use crate::ScoutError;

/// Runs a single discovery with a fresh coordinator
///
/// This is the main entry point for discovering a site. It will:
/// 1. Build the governor and fetch client
/// 2. Read robots.txt and apply its crawl delay
/// 3. Locate and parse sitemaps
/// 4. Crawl the site when no sitemap lists a URL
///
/// # Arguments
///
/// * `config` - The discovery configuration
/// * `base_url` - The site to discover
/// * `rate_rps` - Requests per second allowed against the site
///
/// # Returns
///
/// * `Ok(DiscoveryResult)` - The outcome, which may itself report a failure
/// * `Err(ScoutError)` - The HTTP client could not be built
pub async fn discover(
    config: Config,
    base_url: &str,
    rate_rps: f64,
) -> Result<DiscoveryResult, ScoutError> {
    let coordinator = Coordinator::new(config)?;
    Ok(coordinator.discover(base_url, rate_rps, None).await)
}
