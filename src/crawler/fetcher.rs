//! Governed HTTP fetcher
//!
//! This module performs every HTTP request the engine makes:
//! - Waiting on the domain governor before each attempt, retries included
//! - Rotating browser identities per attempt
//! - Running bodies through the content pipeline
//! - Retrying and signalling the governor according to the retry policy

use crate::config::Config;
use crate::crawler::content::decode_body;
use crate::crawler::governor::Governor;
use crate::crawler::retry::{retry_delay, retry_policy, FetchErrorKind, GovernorSignal};
use crate::url::extract_domain;
use rand::Rng;
use reqwest::{redirect::Policy, Client};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Jitter range applied to retry delays
const RETRY_JITTER: (f64, f64) = (0.8, 1.2);

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// Outcome of one governed fetch
///
/// Failed fetches still carry whatever the server sent, so callers can
/// inspect the body of a 403 or a 500 when it is useful to them.
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    pub success: bool,
    /// Status of the last response, if any response arrived
    pub status_code: Option<u16>,
    /// Decoded body text
    pub content: String,
    /// Decompressed body bytes
    pub content_bytes: Vec<u8>,
    /// Content type after correction
    pub content_type: String,
    /// URL after redirects
    pub final_url: String,
    pub error: Option<String>,
    pub error_kind: Option<FetchErrorKind>,
}

impl FetchResult {
    fn failure(url: &str, kind: FetchErrorKind, error: impl Into<String>) -> Self {
        Self {
            final_url: url.to_string(),
            error: Some(error.into()),
            error_kind: Some(kind),
            ..Self::default()
        }
    }

    /// Whether the response was declared as HTML
    pub fn is_html(&self) -> bool {
        let essence = self.content_type.to_ascii_lowercase();
        essence.contains("text/html") || essence.contains("application/xhtml")
    }
}

/// Fetch client settings
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Default retries after the first attempt
    pub max_retries: u32,
    /// Fixed timeout for one HTTP call
    pub timeout: Duration,
    /// Base delay of transient retries
    pub retry_base: Duration,
    /// Extra factor for retries after 403/429/503
    pub blocked_multiplier: f64,
    /// Browser identities rotated per attempt
    pub identities: Vec<String>,
}

impl FetchConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_retries: config.politeness.max_retries,
            timeout: config.politeness.request_timeout(),
            retry_base: config.politeness.retry_base(),
            blocked_multiplier: config.politeness.blocked_retry_multiplier,
            identities: config.user_agent.identities.clone(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A failed attempt, with whatever response came back
struct AttemptFailure {
    kind: FetchErrorKind,
    message: String,
    partial: Option<FetchResult>,
}

/// HTTP client bound to a governor
pub struct FetchClient {
    client: Client,
    governor: Arc<Governor>,
    config: FetchConfig,
    rotation: AtomicUsize,
}

/// Builds the underlying HTTP client
///
/// Identities are set per request, so the client itself carries no
/// user agent. Redirects are followed up to [`MAX_REDIRECTS`] hops.
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

impl FetchClient {
    /// Creates a fetch client sharing `governor`
    pub fn new(governor: Arc<Governor>, config: FetchConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config)?;
        Ok(Self {
            client,
            governor,
            config,
            rotation: AtomicUsize::new(0),
        })
    }

    pub fn governor(&self) -> &Arc<Governor> {
        &self.governor
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches with the configured default retry budget
    pub async fn get(&self, url: &str) -> FetchResult {
        self.fetch(url, self.config.max_retries).await
    }

    /// Fetches a URL with governed retries
    ///
    /// # Request Flow
    ///
    /// 1. Normalize the domain; a malformed URL fails immediately
    /// 2. For each attempt (`1 + max_retries` at most):
    ///    - wait on the governor for the domain
    ///    - send a GET with the next browser identity
    ///    - decode the body through the content pipeline
    /// 3. On failure, ask the retry policy whether to retry, how long to
    ///    wait and what to tell the governor
    ///
    /// Success is always reported to the governor.
    pub async fn fetch(&self, url: &str, max_retries: u32) -> FetchResult {
        let parsed = match Url::parse(url.trim()) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => u,
            Ok(u) => {
                return FetchResult::failure(
                    url,
                    FetchErrorKind::InvalidUrl,
                    format!("unsupported scheme: {}", u.scheme()),
                )
            }
            Err(e) => return FetchResult::failure(url, FetchErrorKind::InvalidUrl, e.to_string()),
        };

        let domain = match extract_domain(&parsed) {
            Some(d) if !d.is_empty() => d,
            _ => {
                return FetchResult::failure(url, FetchErrorKind::InvalidUrl, "URL has no host")
            }
        };

        let mut attempt = 0;
        loop {
            self.governor.acquire(&domain).await;

            let failure = match self.attempt(&parsed).await {
                Ok(result) => {
                    self.governor.record_outcome(&domain, true).await;
                    return result;
                }
                Err(failure) => failure,
            };

            let decision = retry_policy(failure.kind, self.config.blocked_multiplier);
            match decision.signal {
                GovernorSignal::Success => self.governor.record_outcome(&domain, true).await,
                GovernorSignal::Failure => self.governor.record_outcome(&domain, false).await,
                GovernorSignal::None => {}
            }

            if !decision.retry || attempt >= max_retries {
                if decision.retry {
                    tracing::debug!(
                        "Giving up on {} after {} attempt(s): {}",
                        url,
                        attempt + 1,
                        failure.message
                    );
                }
                return Self::finish_failure(url, failure);
            }

            let delay = retry_delay(
                self.config.retry_base,
                attempt,
                decision.backoff_multiplier,
                rand::thread_rng().gen_range(RETRY_JITTER.0..=RETRY_JITTER.1),
            );
            if failure.kind.is_blocking() {
                tracing::warn!("{} answered {}, retrying in {:?}", url, failure.kind, delay);
            } else {
                tracing::debug!("Retrying {} in {:?} ({})", url, delay, failure.message);
            }
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn finish_failure(url: &str, failure: AttemptFailure) -> FetchResult {
        let mut result = failure.partial.unwrap_or_else(|| FetchResult {
            final_url: url.to_string(),
            ..FetchResult::default()
        });
        result.success = false;
        result.error = Some(failure.message);
        result.error_kind = Some(failure.kind);
        result
    }

    /// Picks the identity for the next attempt
    fn next_identity(&self) -> Option<&str> {
        let identities = &self.config.identities;
        if identities.is_empty() {
            return None;
        }
        let index = self.rotation.fetch_add(1, Ordering::Relaxed) % identities.len();
        identities.get(index).map(String::as_str)
    }

    /// Sends one request and decodes its body
    async fn attempt(&self, url: &Url) -> Result<FetchResult, AttemptFailure> {
        let mut request = self.client.get(url.clone());
        if let Some(identity) = self.next_identity() {
            request = request.header(reqwest::header::USER_AGENT, identity);
        }

        let response = request.send().await.map_err(|e| AttemptFailure {
            kind: FetchErrorKind::from_reqwest(&e),
            message: e.to_string(),
            partial: None,
        })?;

        let status = response.status();
        let final_url = response.url().to_string();
        let declared_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let raw = response.bytes().await.map_err(|e| AttemptFailure {
            kind: FetchErrorKind::from_reqwest(&e),
            message: format!("failed to read body: {}", e),
            partial: None,
        })?;

        let mut result = FetchResult {
            status_code: Some(status.as_u16()),
            content_type: declared_type.clone(),
            final_url: final_url.clone(),
            ..FetchResult::default()
        };

        let decoded = decode_body(&raw, &declared_type, &final_url);

        if !status.is_success() {
            if let Ok(body) = decoded {
                result.content = body.text;
                result.content_bytes = body.bytes;
                result.content_type = body.content_type;
            }
            return Err(AttemptFailure {
                kind: FetchErrorKind::HttpStatus(status.as_u16()),
                message: format!("HTTP {}", status.as_u16()),
                partial: Some(result),
            });
        }

        match decoded {
            Ok(body) => {
                result.success = true;
                result.content = body.text;
                result.content_bytes = body.bytes;
                result.content_type = body.content_type;
                Ok(result)
            }
            Err(e) => {
                tracing::debug!("Could not decode body of {}: {}", final_url, e);
                result.content_bytes = raw.to_vec();
                Err(AttemptFailure {
                    kind: FetchErrorKind::Decode,
                    message: e.to_string(),
                    partial: Some(result),
                })
            }
        }
    }
}
