//! Configuration module for Sitemap-Scout
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every setting has a default, so `Config::default()`
//! is a complete, valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use sitemap_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! println!("Worker pool width: {}", config.discovery.worker_pool_width);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, DiscoveryConfig, PolitenessConfig, UserAgentConfig, DEFAULT_IDENTITIES,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
