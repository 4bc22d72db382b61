//! Shared helpers for the integration tests

use flate2::write::GzEncoder;
use flate2::Compression;
use sitemap_scout::config::Config;
use sitemap_scout::crawler::{FetchClient, FetchConfig, Governor, GovernorConfig};
use std::io::Write;
use std::sync::Arc;
use wiremock::{Request, Respond, ResponseTemplate};

/// Creates a configuration with fast pacing and short retry delays
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.politeness.rate = 100.0;
    config.politeness.max_retries = 2;
    config.politeness.request_timeout_secs = 5;
    config.politeness.retry_base_ms = 1;
    config.politeness.backoff_base_secs = 0.01;
    config.politeness.backoff_cap_secs = 0.05;
    config.discovery.probe_max_retries = 0;
    config.discovery.describe_entries = false;
    config.discovery.max_pages = 20;
    config
}

/// Builds a governed fetch client for `config`
pub fn test_client(config: &Config) -> Arc<FetchClient> {
    let governor = Arc::new(Governor::new(GovernorConfig::from_config(config)));
    Arc::new(
        FetchClient::new(governor, FetchConfig::from_config(config))
            .expect("Failed to build fetch client"),
    )
}

pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

pub fn xml(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "application/xml")
}

/// Builds a `<urlset>` listing `locs`
pub fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<url><loc>{}</loc></url>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

/// Builds a `<sitemapindex>` listing `locs`
pub fn sitemap_index(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|loc| format!("<sitemap><loc>{}</loc></sitemap>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
        entries
    )
}

pub fn gzip(body: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(body.as_bytes())
        .expect("Failed to gzip body");
    encoder.finish().expect("Failed to finish gzip stream")
}

/// Responder for an endless site: every page links to ten children
pub struct LinkFarm;

impl Respond for LinkFarm {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let path = request.url.path().trim_end_matches('/');
        let links: String = (0..10)
            .map(|i| format!(r#"<a href="{}/n{}">child {}</a>"#, path, i, i))
            .collect();
        html(&format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            path, links
        ))
    }
}
