//! URL handling module for Sitemap-Scout
//!
//! This module provides domain normalization (the rate-governance key) and
//! URL normalization (the visited/queued bookkeeping key).

mod domain;
mod normalize;

pub use domain::{extract_domain, normalize_domain, same_domain};
pub use normalize::normalize_url;
