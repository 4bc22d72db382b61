use serde::Deserialize;
use std::time::Duration;

/// Browser identities rotated across fetch attempts
pub const DEFAULT_IDENTITIES: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

/// Main configuration structure for Sitemap-Scout
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// Request pacing, retry and backoff configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolitenessConfig {
    /// Requests per second the user allows against one domain
    pub rate: f64,

    /// Retries after the first attempt of a fetch
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Fixed timeout for one HTTP call (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Base delay before retrying a transient failure (milliseconds)
    #[serde(rename = "retry-base-ms")]
    pub retry_base_ms: u64,

    /// Multiplier applied to the retry delay for 403/429/503 responses
    #[serde(rename = "blocked-retry-multiplier")]
    pub blocked_retry_multiplier: f64,

    /// Base of the per-domain failure backoff (seconds)
    #[serde(rename = "backoff-base-secs")]
    pub backoff_base_secs: f64,

    /// Upper bound of the per-domain failure backoff (seconds)
    #[serde(rename = "backoff-cap-secs")]
    pub backoff_cap_secs: f64,

    /// Continuous activity on one domain before a forced cooldown (seconds)
    #[serde(rename = "session-limit-secs")]
    pub session_limit_secs: u64,

    #[serde(rename = "session-cooldown-min-secs")]
    pub session_cooldown_min_secs: u64,

    #[serde(rename = "session-cooldown-max-secs")]
    pub session_cooldown_max_secs: u64,
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            max_retries: 3,
            request_timeout_secs: 30,
            retry_base_ms: 1000,
            blocked_retry_multiplier: 4.0,
            backoff_base_secs: 2.0,
            backoff_cap_secs: 600.0,
            session_limit_secs: 50 * 60,
            session_cooldown_min_secs: 120,
            session_cooldown_max_secs: 300,
        }
    }
}

impl PolitenessConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_base(&self) -> Duration {
        Duration::from_millis(self.retry_base_ms)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_base_secs)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_secs_f64(self.backoff_cap_secs)
    }

    pub fn session_limit(&self) -> Duration {
        Duration::from_secs(self.session_limit_secs)
    }

    pub fn session_cooldown(&self) -> (Duration, Duration) {
        (
            Duration::from_secs(self.session_cooldown_min_secs),
            Duration::from_secs(self.session_cooldown_max_secs),
        )
    }
}

/// Discovery behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Page budget of the fallback crawl
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Width of the shared worker pool
    #[serde(rename = "worker-pool-width")]
    pub worker_pool_width: usize,

    /// Retries used by sitemap location probes
    #[serde(rename = "probe-max-retries")]
    pub probe_max_retries: u32,

    /// Fetch pages listed in sitemaps to fill in their descriptions
    #[serde(rename = "describe-entries")]
    pub describe_entries: bool,

    /// Most sitemap entries fetched for descriptions in one discovery
    #[serde(rename = "describe-limit")]
    pub describe_limit: usize,

    /// Maximum length (in characters) of a stored meta description
    #[serde(rename = "description-length")]
    pub description_length: usize,

    /// Skip links the site's robots.txt disallows during the fallback crawl
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_pages: 500,
            worker_pool_width: 5,
            probe_max_retries: 1,
            describe_entries: true,
            describe_limit: 200,
            description_length: 500,
            respect_robots: true,
        }
    }
}

/// Identity strings presented to servers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Pool of browser identities, rotated per attempt
    pub identities: Vec<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            identities: DEFAULT_IDENTITIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}
