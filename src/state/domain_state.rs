use std::time::Duration;
use tokio::time::Instant;

/// Largest exponent used by the failure backoff; keeps the arithmetic finite
const MAX_BACKOFF_EXPONENT: u32 = 30;

/// Computes the effective request interval for a domain
///
/// The user-requested interval is `1 / rate_rps`. A robots.txt crawl delay
/// replaces it only when it is strictly longer; on a tie the user setting is
/// kept. A non-positive or non-finite crawl delay is ignored.
pub fn effective_interval(rate_rps: f64, crawl_delay: Option<f64>) -> Duration {
    let user_secs = 1.0 / rate_rps;
    let robots_secs = crawl_delay
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(0.0);

    if robots_secs > user_secs {
        Duration::from_secs_f64(robots_secs)
    } else {
        Duration::from_secs_f64(user_secs)
    }
}

/// Computes the failure backoff window after `failures` consecutive failures
///
/// `base * 2^(failures - 1) * jitter`, never more than `cap`. With jitter in
/// `[0.8, 1.2]` successive windows never shrink.
pub fn backoff_window(failures: u32, base: Duration, cap: Duration, jitter: f64) -> Duration {
    if failures == 0 {
        return Duration::ZERO;
    }

    let exponent = (failures - 1).min(MAX_BACKOFF_EXPONENT);
    let secs = base.as_secs_f64() * 2f64.powi(exponent as i32) * jitter;

    Duration::try_from_secs_f64(secs)
        .map(|window| window.min(cap))
        .unwrap_or(cap)
}

/// Why `acquire` had to wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    /// No wait needed
    Ready,
    /// Remainder of the request interval
    Interval,
    /// An armed backoff window (failure or session cooldown)
    Backoff,
}

/// Tracks the pacing state of a single domain
///
/// Owned by the governor and only mutated while that domain's lock is held.
#[derive(Debug, Clone)]
pub struct DomainState {
    /// Normalized domain this state belongs to
    pub domain: String,

    /// Minimum spacing between two request starts
    pub request_interval: Duration,

    /// Start of the most recent request; `None` lets the first request
    /// proceed immediately, exactly as if it were `now - interval`
    pub last_request_time: Option<Instant>,

    /// No request may start before this instant; applied once then cleared
    pub backoff_until: Option<Instant>,

    /// Failures since the last success
    pub consecutive_failures: u32,

    /// Start of the current continuous session against this domain
    pub session_start_time: Instant,
}

impl DomainState {
    /// Creates a new DomainState with the given interval
    pub fn new(domain: impl Into<String>, request_interval: Duration, now: Instant) -> Self {
        Self {
            domain: domain.into(),
            request_interval,
            last_request_time: None,
            backoff_until: None,
            consecutive_failures: 0,
            session_start_time: now,
        }
    }

    /// Applies a new interval and clears failure state
    ///
    /// The time of the last request is kept, so reconfiguring a busy domain
    /// never lets the next request start early.
    pub fn reconfigure(&mut self, request_interval: Duration) {
        self.request_interval = request_interval;
        self.backoff_until = None;
        self.consecutive_failures = 0;
    }

    /// Computes the wait before the next request and consumes any backoff
    ///
    /// The wait is the longer of the armed backoff remainder and the
    /// interval remainder, so a short backoff never lets a request start
    /// inside the interval. The backoff is cleared here and served once.
    pub fn take_wait(&mut self, now: Instant) -> (Duration, WaitReason) {
        let backoff = self
            .backoff_until
            .take()
            .map_or(Duration::ZERO, |until| until.saturating_duration_since(now));

        let interval = self.last_request_time.map_or(Duration::ZERO, |last| {
            self.request_interval
                .saturating_sub(now.saturating_duration_since(last))
        });

        if backoff.is_zero() && interval.is_zero() {
            (Duration::ZERO, WaitReason::Ready)
        } else if backoff > interval {
            (backoff, WaitReason::Backoff)
        } else {
            (interval, WaitReason::Interval)
        }
    }

    /// Records that a request started at `now`
    pub fn record_request(&mut self, now: Instant) {
        self.last_request_time = Some(now);
    }

    /// Resets the failure counter after a successful request
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Counts a failure and arms the backoff window
    ///
    /// Returns the armed window.
    pub fn record_failure(
        &mut self,
        now: Instant,
        base: Duration,
        cap: Duration,
        jitter: f64,
    ) -> Duration {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        let window = backoff_window(self.consecutive_failures, base, cap, jitter);
        let until = now + window;
        self.backoff_until = Some(match self.backoff_until {
            Some(existing) if existing > until => existing,
            _ => until,
        });
        window
    }

    /// Forces a cooldown after a long continuous session
    ///
    /// A domain that has been idle for at least `idle_reset` starts a fresh
    /// session. Once the session has lasted `limit`, a cooldown produced by
    /// `cooldown` is armed as backoff and the session clock restarts after it.
    /// Returns the cooldown when one was armed.
    pub fn rotate_session(
        &mut self,
        now: Instant,
        limit: Duration,
        idle_reset: Duration,
        cooldown: impl FnOnce() -> Duration,
    ) -> Option<Duration> {
        if let Some(last) = self.last_request_time {
            if now.saturating_duration_since(last) >= idle_reset {
                self.session_start_time = now;
            }
        }

        if now.saturating_duration_since(self.session_start_time) < limit {
            return None;
        }

        let pause = cooldown();
        let until = now + pause;
        self.backoff_until = Some(match self.backoff_until {
            Some(existing) if existing > until => existing,
            _ => until,
        });
        self.session_start_time = until;
        Some(pause)
    }
}
