//! Integration tests for Sitemap-Scout
//!
//! These tests use wiremock to create mock HTTP servers and run the
//! governed fetch client, sitemap stages, fallback crawler and the full
//! discovery end-to-end.

mod common;
mod crawler_tests;
mod discovery_tests;
mod fetch_tests;
mod sitemap_tests;
