//! Discovery coordinator - the top-level orchestration
//!
//! A discovery runs through these stages:
//! - Validating the base URL and rate, and initializing the domain
//! - Reading robots.txt for a crawl delay (cached per domain)
//! - Locating sitemaps
//! - Parsing them into URL records
//! - Falling back to a crawl when no sitemap yields a URL
//!
//! Every error and panic inside a discovery becomes a failed
//! [`DiscoveryResult`] that keeps the URLs collected so far.

use crate::config::Config;
use crate::crawler::fallback::{FallbackCrawler, RobotsFilter};
use crate::crawler::fetcher::{FetchClient, FetchConfig};
use crate::crawler::governor::{Governor, GovernorConfig};
use crate::output::{DiscoveryMethod, DiscoveryResult, UrlRecord};
use crate::robots::{fetch_robots, robots_agent, ParsedRobots, RobotsCache};
use crate::sitemap::{EnrichOptions, SitemapLocator, SitemapParser};
use crate::url::extract_domain;
use crate::{ScoutError, UrlError};
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use url::Url;

/// Stage a discovery has reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Locate,
    Parse,
    FallbackCrawl,
    Done,
}

/// What a discovery has collected so far
#[derive(Debug)]
struct Progress {
    stage: Stage,
    method: Option<DiscoveryMethod>,
    urls: Vec<UrlRecord>,
}

/// Main discovery coordinator
///
/// One coordinator owns a governor, fetch client and robots cache. Clones
/// of [`Coordinator::client`] can be handed to later stages so politeness
/// state stays shared with them.
pub struct Coordinator {
    config: Config,
    client: Arc<FetchClient>,
    robots: RobotsCache,
    agent: String,
}

impl Coordinator {
    /// Creates a coordinator with its own governor
    pub fn new(config: Config) -> Result<Self, ScoutError> {
        let governor = Arc::new(Governor::new(GovernorConfig::from_config(&config)));
        Self::with_governor(config, governor)
    }

    /// Creates a coordinator that shares an existing governor
    pub fn with_governor(config: Config, governor: Arc<Governor>) -> Result<Self, ScoutError> {
        let client = Arc::new(FetchClient::new(governor, FetchConfig::from_config(&config))?);
        let agent = robots_agent(config.user_agent.identities.first().map(String::as_str));
        Ok(Self {
            config,
            client,
            robots: RobotsCache::new(),
            agent,
        })
    }

    /// The governed fetch client used by every stage
    pub fn client(&self) -> &Arc<FetchClient> {
        &self.client
    }

    pub fn governor(&self) -> &Arc<Governor> {
        self.client.governor()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Discovers the URLs of the site at `base_url`
    ///
    /// # Arguments
    ///
    /// * `base_url` - Site URL, scheme required
    /// * `rate_rps` - Requests per second allowed against the site
    /// * `max_pages` - Page budget of a fallback crawl (configured value if `None`)
    ///
    /// Never fails: errors are reported inside the result.
    pub async fn discover(
        &self,
        base_url: &str,
        rate_rps: f64,
        max_pages: Option<usize>,
    ) -> DiscoveryResult {
        let started = Instant::now();
        let mut progress = Progress {
            stage: Stage::Start,
            method: None,
            urls: Vec::new(),
        };

        let outcome = AssertUnwindSafe(self.run(base_url, rate_rps, max_pages, &mut progress))
            .catch_unwind()
            .await;

        finish(base_url, outcome, progress, started.elapsed())
    }

    async fn run(
        &self,
        base_url: &str,
        rate_rps: f64,
        max_pages: Option<usize>,
        progress: &mut Progress,
    ) -> Result<(), ScoutError> {
        let base = parse_base_url(base_url)?;
        let page_budget = max_pages.unwrap_or(self.config.discovery.max_pages);
        if page_budget == 0 {
            return Err(ScoutError::InvalidPageBudget(page_budget));
        }
        let domain = extract_domain(&base)
            .filter(|d| !d.is_empty())
            .ok_or(UrlError::MissingDomain)?;
        let governor = self.client.governor();

        governor.init(&domain, rate_rps, None).await?;
        let robots = self.robots_for(&domain, &base).await;
        let crawl_delay = robots.crawl_delay(&self.agent);
        if crawl_delay.is_some() {
            governor.init(&domain, rate_rps, crawl_delay).await?;
        }

        progress.stage = Stage::Locate;
        let locator = SitemapLocator::new(
            Arc::clone(&self.client),
            self.config.discovery.probe_max_retries,
        );
        let sitemaps = locator.locate(&base).await;

        if !sitemaps.is_empty() {
            progress.stage = Stage::Parse;
            progress.method = Some(DiscoveryMethod::ExistingSitemap);

            let parser = SitemapParser::new(Arc::clone(&self.client), self.enrich_options());
            let mut records = parser.collect(&sitemaps).await;
            // kept in case enrichment stops the run
            progress.urls = dedup_records(records.iter().cloned().map(UrlRecord::from));

            if !records.is_empty() {
                parser.enrich(&mut records).await;
                progress.urls = dedup_records(records.into_iter().map(UrlRecord::from));
            }

            if !progress.urls.is_empty() {
                progress.stage = Stage::Done;
                return Ok(());
            }
            tracing::info!(
                "Located {} sitemap(s) for {} but none listed a URL, falling back to crawling",
                sitemaps.len(),
                domain
            );
        } else {
            tracing::info!("No sitemap found for {}, falling back to crawling", domain);
        }

        progress.stage = Stage::FallbackCrawl;
        progress.method = Some(DiscoveryMethod::Generated);

        let filter = self.config.discovery.respect_robots.then(|| RobotsFilter {
            robots,
            agent: self.agent.clone(),
        });
        let crawler = FallbackCrawler::new(
            Arc::clone(&self.client),
            self.config.discovery.description_length,
        );
        let pages = crawler.crawl(&base, page_budget, filter.as_ref()).await;
        progress.urls = dedup_records(pages.into_iter().map(UrlRecord::from));
        progress.stage = Stage::Done;
        Ok(())
    }

    /// Returns robots.txt for a domain, fetching it when not cached
    async fn robots_for(&self, domain: &str, base: &Url) -> ParsedRobots {
        if let Some(robots) = self.robots.get(domain) {
            tracing::debug!("Using cached robots.txt for {}", domain);
            return robots;
        }

        let robots = fetch_robots(
            &self.client,
            base,
            self.config.discovery.probe_max_retries,
        )
        .await;
        self.robots.insert(domain, robots.clone());
        robots
    }

    fn enrich_options(&self) -> EnrichOptions {
        EnrichOptions {
            enabled: self.config.discovery.describe_entries,
            limit: self.config.discovery.describe_limit,
            description_length: self.config.discovery.description_length,
            max_retries: self.config.discovery.probe_max_retries,
        }
    }
}

/// Parses the base URL, which must carry an http(s) scheme and a host
pub fn parse_base_url(base_url: &str) -> Result<Url, UrlError> {
    let url = Url::parse(base_url.trim())
        .map_err(|e| UrlError::Parse(format!("{}: {}", base_url, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }
    Ok(url)
}

/// Keeps the first record for every `loc`
pub fn dedup_records(records: impl IntoIterator<Item = UrlRecord>) -> Vec<UrlRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.loc().to_string()))
        .collect()
}

/// Turns the outcome of a discovery run into its result
///
/// Failures keep the method and URLs the run had recorded before it stopped.
fn finish(
    base_url: &str,
    outcome: std::thread::Result<Result<(), ScoutError>>,
    progress: Progress,
    elapsed: Duration,
) -> DiscoveryResult {
    let error = match outcome {
        Ok(Ok(())) => {
            let method = progress.method.unwrap_or(DiscoveryMethod::Generated);
            tracing::info!(
                "Discovered {} URL(s) for {} via {} in {:.2}s",
                progress.urls.len(),
                base_url,
                method,
                elapsed.as_secs_f64()
            );
            return DiscoveryResult::succeeded(method, progress.urls, elapsed);
        }
        Ok(Err(e)) => e,
        Err(panic) => ScoutError::Internal(panic_message(panic.as_ref())),
    };

    tracing::error!(
        "Discovery of {} failed during {:?}: {}",
        base_url,
        progress.stage,
        error
    );
    DiscoveryResult::failed(error.to_string(), progress.method, progress.urls, elapsed)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
