//! Retry policy for fetch failures
//!
//! Every failed attempt is classified into a [`FetchErrorKind`]; one policy
//! function maps the kind to whether to retry, how much longer to wait, and
//! what to tell the domain governor.

use std::fmt;
use std::time::Duration;

/// Tagged kind of a failed fetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// The request did not complete within the per-call timeout
    Timeout,
    /// Connection refused/reset, DNS, TLS or body-transfer failures
    Connection,
    /// Redirect loop or too many redirects
    Redirect,
    /// The server answered with a non-success status
    HttpStatus(u16),
    /// The body could not be decompressed
    Decode,
    /// The URL could not be parsed or has no usable host
    InvalidUrl,
}

impl FetchErrorKind {
    /// Classifies a transport error from reqwest
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_redirect() {
            Self::Redirect
        } else if error.is_builder() {
            Self::InvalidUrl
        } else {
            Self::Connection
        }
    }

    /// Whether this outcome means the site is actively refusing us
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::HttpStatus(403 | 429 | 503))
    }

    /// Whether this outcome is worth retrying as a transient error
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Connection => true,
            Self::HttpStatus(code) => (500..600).contains(code) && *code != 503,
            _ => false,
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Connection => write!(f, "connection error"),
            Self::Redirect => write!(f, "redirect error"),
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
            Self::Decode => write!(f, "content decode error"),
            Self::InvalidUrl => write!(f, "invalid URL"),
        }
    }
}

/// What the governor should learn from an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernorSignal {
    /// Leave the domain's failure state alone
    None,
    /// The server answered normally
    Success,
    /// Count a failure and arm backoff
    Failure,
}

/// Decision for one failed attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryDecision {
    pub retry: bool,
    pub backoff_multiplier: f64,
    pub signal: GovernorSignal,
}

/// Maps a failure kind to the retry decision
///
/// | Kind | Retry | Multiplier | Governor |
/// |------|-------|------------|----------|
/// | Timeout, Connection, 5xx (not 503) | yes | 1 | none |
/// | 403, 429, 503 | yes | `blocked_multiplier` | failure |
/// | 404 | no | - | none |
/// | other HTTP status, Redirect | no | - | failure |
/// | Decode | no | - | success |
/// | InvalidUrl | no | - | none |
pub fn retry_policy(kind: FetchErrorKind, blocked_multiplier: f64) -> RetryDecision {
    let stop = |signal| RetryDecision {
        retry: false,
        backoff_multiplier: 1.0,
        signal,
    };

    match kind {
        k if k.is_transient() => RetryDecision {
            retry: true,
            backoff_multiplier: 1.0,
            signal: GovernorSignal::None,
        },
        k if k.is_blocking() => RetryDecision {
            retry: true,
            backoff_multiplier: blocked_multiplier.max(1.0),
            signal: GovernorSignal::Failure,
        },
        FetchErrorKind::HttpStatus(404) => stop(GovernorSignal::None),
        FetchErrorKind::HttpStatus(_) | FetchErrorKind::Redirect => stop(GovernorSignal::Failure),
        FetchErrorKind::Decode => stop(GovernorSignal::Success),
        FetchErrorKind::InvalidUrl | FetchErrorKind::Timeout | FetchErrorKind::Connection => {
            stop(GovernorSignal::None)
        }
    }
}

/// Delay before retry number `attempt + 1`: `base * 2^attempt * multiplier * jitter`
pub fn retry_delay(base: Duration, attempt: u32, multiplier: f64, jitter: f64) -> Duration {
    let factor = 2f64.powi(attempt.min(16) as i32) * multiplier * jitter;
    Duration::try_from_secs_f64(base.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}
