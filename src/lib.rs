//! Sitemap-Scout: a polite website URL discovery engine
//!
//! This crate discovers the crawlable URLs of a website, either from the
//! site's own sitemaps or, when none are usable, from a bounded breadth-first
//! crawl. Every request goes through a per-domain rate governor that spaces
//! requests, honours robots.txt crawl delays and backs off when a site
//! signals that it is blocking us.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod sitemap;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sitemap-Scout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid request rate {0}: must be a positive number of requests per second")]
    InvalidRate(f64),

    #[error("Invalid page budget {0}: at least one page must be allowed")]
    InvalidPageBudget(usize),

    #[error("Internal fault: {0}")]
    Internal(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Sitemap-Scout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, FetchClient, FetchResult, Governor};
pub use output::{DiscoveryMethod, DiscoveryResult, OutputFormat, UrlRecord};
pub use state::DomainState;
pub use url::normalize_domain;
