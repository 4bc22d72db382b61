//! Per-domain rate governor
//!
//! The governor owns one [`DomainState`] per domain, each behind its own
//! async mutex. Callers for the same domain queue on that mutex and the
//! holder sleeps out the remaining interval (or armed backoff) *while still
//! holding it*, so request starts to one domain are totally ordered and
//! spaced by at least the domain's interval. Different domains never
//! contend. The domain table lives as long as the governor.

use crate::config::Config;
use crate::crawler::pool::WorkerPool;
use crate::state::{effective_interval, DomainState, WaitReason};
use crate::ScoutError;
use rand::Rng;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;

/// Jitter range applied to failure backoff windows
const BACKOFF_JITTER: (f64, f64) = (0.8, 1.2);

/// Tunables of the governor
#[derive(Debug, Clone)]
pub struct GovernorConfig {
    /// Rate used for domains contacted before `init` (requests per second)
    pub default_rate: f64,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
    /// Continuous activity allowed before a forced cooldown
    pub session_limit: Duration,
    pub session_cooldown_min: Duration,
    pub session_cooldown_max: Duration,
    /// Width of the shared worker pool
    pub pool_width: usize,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl GovernorConfig {
    /// Builds the governor settings from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        let (cooldown_min, cooldown_max) = config.politeness.session_cooldown();
        Self {
            default_rate: config.politeness.rate,
            backoff_base: config.politeness.backoff_base(),
            backoff_cap: config.politeness.backoff_cap(),
            session_limit: config.politeness.session_limit(),
            session_cooldown_min: cooldown_min,
            session_cooldown_max: cooldown_max,
            pool_width: config.discovery.worker_pool_width,
        }
    }
}

/// Serializes and paces requests per domain
pub struct Governor {
    /// Per-domain state, one lock per domain; the outer lock only guards
    /// insertion into the table and is never held across an await
    domains: Mutex<HashMap<String, Arc<AsyncMutex<DomainState>>>>,
    config: GovernorConfig,
    pool: WorkerPool,
}

impl Governor {
    /// Creates a governor with an empty domain table
    pub fn new(config: GovernorConfig) -> Self {
        let pool = WorkerPool::new(config.pool_width);
        Self {
            domains: Mutex::new(HashMap::new()),
            config,
            pool,
        }
    }

    /// The worker pool shared by everything using this governor
    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// Number of domains contacted so far
    pub fn domain_count(&self) -> usize {
        self.domains
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Returns the lock for a domain, creating its state on first use
    fn slot(&self, domain: &str) -> Arc<AsyncMutex<DomainState>> {
        let mut domains = self
            .domains
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let slot = domains.entry(domain.to_string()).or_insert_with(|| {
            let interval = effective_interval(self.config.default_rate, None);
            tracing::debug!("Tracking new domain {} (interval {:?})", domain, interval);
            Arc::new(AsyncMutex::new(DomainState::new(
                domain,
                interval,
                Instant::now(),
            )))
        });

        Arc::clone(slot)
    }

    /// Sets a domain's interval from the user rate and robots.txt crawl delay
    ///
    /// The interval is `max(1 / rate_rps, crawl_delay)`, keeping the user
    /// setting on a tie. Failure and backoff state is cleared; a domain that
    /// was already contacted keeps the time of its last request.
    ///
    /// # Returns
    ///
    /// * `Ok(Duration)` - The effective interval now in force
    /// * `Err(ScoutError::InvalidRate)` - `rate_rps` is not a positive number
    pub async fn init(
        &self,
        domain: &str,
        rate_rps: f64,
        crawl_delay: Option<f64>,
    ) -> Result<Duration, ScoutError> {
        if !(rate_rps.is_finite() && rate_rps > 0.0) {
            return Err(ScoutError::InvalidRate(rate_rps));
        }

        let interval = effective_interval(rate_rps, crawl_delay);
        let slot = self.slot(domain);
        let mut state = slot.lock().await;
        state.reconfigure(interval);

        match crawl_delay {
            Some(delay) if delay > 1.0 / rate_rps => tracing::info!(
                "Domain {}: robots.txt crawl-delay {}s is stricter than {} req/s, interval {:?}",
                domain,
                delay,
                rate_rps,
                interval
            ),
            _ => tracing::debug!("Domain {}: interval {:?}", domain, interval),
        }

        Ok(interval)
    }

    /// Waits until a request to `domain` may start, then claims that slot
    ///
    /// The domain's lock is held across the sleep and `last_request_time`
    /// is updated before it is released.
    pub async fn acquire(&self, domain: &str) {
        let slot = self.slot(domain);
        let mut state = slot.lock().await;
        let now = Instant::now();

        if let Some(pause) = state.rotate_session(
            now,
            self.config.session_limit,
            self.config.session_cooldown_min,
            || self.session_cooldown(),
        ) {
            tracing::warn!(
                "Domain {}: long continuous session, cooling down for {:?}",
                domain,
                pause
            );
        }

        let (wait, reason) = state.take_wait(now);
        match reason {
            WaitReason::Ready => {}
            WaitReason::Interval => {
                tracing::trace!("Domain {}: waiting {:?} for interval", domain, wait);
                tokio::time::sleep(wait).await;
            }
            WaitReason::Backoff => {
                tracing::debug!("Domain {}: serving backoff of {:?}", domain, wait);
                tokio::time::sleep(wait).await;
            }
        }

        state.record_request(Instant::now());
    }

    /// Records the outcome of a request
    ///
    /// Success resets the failure counter. Failure increments it and arms a
    /// backoff window of `min(base * 2^(failures-1) * jitter, cap)`. A 404 is
    /// not a failure and must not be reported here.
    pub async fn record_outcome(&self, domain: &str, success: bool) {
        let slot = self.slot(domain);
        let mut state = slot.lock().await;

        if success {
            if state.consecutive_failures > 0 {
                tracing::debug!(
                    "Domain {}: success after {} failure(s)",
                    domain,
                    state.consecutive_failures
                );
            }
            state.record_success();
            return;
        }

        let window = state.record_failure(
            Instant::now(),
            self.config.backoff_base,
            self.config.backoff_cap,
            backoff_jitter(),
        );
        tracing::warn!(
            "Domain {}: {} consecutive failure(s), backing off for {:?}",
            domain,
            state.consecutive_failures,
            window
        );
    }

    /// Returns a copy of a domain's current state, if it has been contacted
    pub async fn snapshot(&self, domain: &str) -> Option<DomainState> {
        let slot = {
            let domains = self
                .domains
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            domains.get(domain).cloned()
        }?;
        let state = slot.lock().await;
        Some(state.clone())
    }

    /// Picks a random session cooldown within the configured range
    fn session_cooldown(&self) -> Duration {
        let min = self.config.session_cooldown_min;
        let max = self.config.session_cooldown_max;
        if max <= min {
            return min;
        }
        let secs = rand::thread_rng().gen_range(min.as_secs_f64()..=max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

fn backoff_jitter() -> f64 {
    rand::thread_rng().gen_range(BACKOFF_JITTER.0..=BACKOFF_JITTER.1)
}
