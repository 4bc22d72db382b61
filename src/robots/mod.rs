//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching
//! robots.txt files. Fetching goes through the governed fetch client, so
//! robots requests are paced like every other request.

mod cache;
mod parser;

pub use cache::{CachedRobots, RobotsCache};
pub use parser::{sitemap_directives, ParsedRobots};

use crate::crawler::FetchClient;
use url::Url;

/// Returns the robots.txt URL for the origin of `base`
pub fn robots_url(base: &Url) -> Option<Url> {
    base.join("/robots.txt").ok()
}

/// Fetches robots.txt for the site of `base`
///
/// A missing or unreadable robots.txt allows everything.
///
/// # Arguments
///
/// * `client` - The governed fetch client
/// * `base` - Any URL on the site
/// * `max_retries` - Retry budget for the request
pub async fn fetch_robots(client: &FetchClient, base: &Url, max_retries: u32) -> ParsedRobots {
    let Some(url) = robots_url(base) else {
        return ParsedRobots::allow_all();
    };

    let result = client.fetch(url.as_str(), max_retries).await;
    if result.success {
        tracing::debug!("Fetched {} ({} bytes)", url, result.content.len());
        ParsedRobots::from_content(&result.content)
    } else {
        tracing::debug!(
            "No usable robots.txt at {}: {}",
            url,
            result.error.as_deref().unwrap_or("unknown error")
        );
        ParsedRobots::allow_all()
    }
}

/// Product token used when matching robots.txt groups
///
/// Browser identities look like `Mozilla/5.0 (...)`; robots.txt groups name
/// products, so only the part before the first `/` is matched.
pub fn robots_agent(identity: Option<&str>) -> String {
    identity
        .and_then(|id| id.split(['/', ' ']).next())
        .filter(|token| !token.is_empty())
        .unwrap_or("*")
        .to_string()
}
