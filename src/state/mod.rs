//! State module for per-domain pacing
//!
//! `DomainState` holds the timing, backoff and session bookkeeping of one
//! domain. The governor owns one per domain contacted and mutates it only
//! while holding that domain's lock.

mod domain_state;

pub use domain_state::{backoff_window, effective_interval, DomainState, WaitReason};
