//! Sitemap discovery module
//!
//! This module contains:
//! - The locator, which probes a site for sitemap URLs
//! - The parser, which resolves indexes into URL records
//! - The pure extraction strategies both of them rely on

pub mod extract;
mod locator;
mod parser;

pub use locator::{
    inspect_robots, inspect_sitemap_probe, probe_targets, Probe, ProbeKind, SitemapLocator,
    WELL_KNOWN_PATHS,
};
pub use parser::{EnrichOptions, SitemapParser};
