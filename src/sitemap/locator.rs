//! Sitemap locator
//!
//! Probes well-known sitemap paths and robots.txt on both protocol variants
//! of a site. All probes run on the governor's worker pool; a failed probe
//! only means that probe contributes nothing.

use crate::crawler::{extract_sitemap_anchors, FetchClient, FetchResult};
use crate::robots::sitemap_directives;
use crate::sitemap::extract::{extract_heuristic, find_sitemap_urls, has_sitemap_root, has_sitemap_signature};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Paths probed on every site
pub const WELL_KNOWN_PATHS: &[&str] = &[
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/sitemap.xml.gz",
    "/sitemap1.xml",
    "/sitemaps.xml",
    "/sitemap/sitemap.xml",
    "/wp-sitemap.xml",
    "/sitemap.txt",
    "/sitemap/",
];

/// What a probe is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    /// A robots.txt file whose `Sitemap:` lines are collected
    Robots,
    /// A URL that may itself be a sitemap or list sitemaps
    Sitemap,
}

/// One URL to probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    pub url: String,
    pub kind: ProbeKind,
}

/// Builds the probe list: every well-known path and robots.txt, on the
/// base URL's scheme first and then the other one
pub fn probe_targets(base: &Url) -> Vec<Probe> {
    let mut origins = vec![base.clone()];
    let mut other = base.clone();
    let other_scheme = if base.scheme() == "https" { "http" } else { "https" };
    if other.set_scheme(other_scheme).is_ok() {
        origins.push(other);
    }

    let mut probes = Vec::new();
    for origin in &origins {
        if let Ok(url) = origin.join("/robots.txt") {
            probes.push(Probe {
                url: url.to_string(),
                kind: ProbeKind::Robots,
            });
        }
        for path in WELL_KNOWN_PATHS {
            if let Ok(url) = origin.join(path) {
                probes.push(Probe {
                    url: url.to_string(),
                    kind: ProbeKind::Sitemap,
                });
            }
        }
    }
    probes
}

/// Finds candidate sitemap URLs for a site
pub struct SitemapLocator {
    client: Arc<FetchClient>,
    probe_retries: u32,
}

impl SitemapLocator {
    pub fn new(client: Arc<FetchClient>, probe_retries: u32) -> Self {
        Self {
            client,
            probe_retries,
        }
    }

    /// Probes the site of `base` and returns the sitemap URLs found
    ///
    /// The result holds no duplicates and keeps probe order, so URLs found
    /// on the base URL's own scheme come first.
    pub async fn locate(&self, base: &Url) -> Vec<String> {
        let probes = probe_targets(base);
        tracing::debug!("Probing {} sitemap locations for {}", probes.len(), base);

        let pool = self.client.governor().pool();
        let found = pool.run_all(probes, |probe| self.run_probe(probe)).await;

        let mut seen = HashSet::new();
        let located: Vec<String> = found
            .into_iter()
            .flatten()
            .filter(|url| seen.insert(url.clone()))
            .collect();

        tracing::info!("Located {} sitemap(s) for {}", located.len(), base);
        located
    }

    async fn run_probe(&self, probe: Probe) -> Vec<String> {
        let result = self.client.fetch(&probe.url, self.probe_retries).await;
        let found = match probe.kind {
            ProbeKind::Robots => inspect_robots(&result),
            ProbeKind::Sitemap => inspect_sitemap_probe(&probe.url, &result),
        };

        if !found.is_empty() {
            tracing::debug!("Probe {} contributed {} URL(s)", probe.url, found.len());
        }
        found
    }
}

/// Collects `Sitemap:` declarations from a robots.txt response
pub fn inspect_robots(result: &FetchResult) -> Vec<String> {
    if !result.success {
        return Vec::new();
    }
    sitemap_directives(&result.content)
}

/// Decides what a sitemap-path probe contributes
///
/// * 200 with an XML content type or sitemap signature: the URL itself
/// * 200 HTML directory listing: its `.xml` anchors mentioning "sitemap"
/// * 200 plain text: embedded absolute `.xml` URLs, and the URL itself when
///   the body is a list of page URLs
/// * any other status: the URL itself, if the body has a sitemap root
pub fn inspect_sitemap_probe(probe_url: &str, result: &FetchResult) -> Vec<String> {
    if result.status_code.is_none() {
        return Vec::new();
    }

    let located = if result.final_url.is_empty() {
        probe_url.to_string()
    } else {
        result.final_url.clone()
    };
    let body = result.content.as_str();

    if !result.success {
        return if has_sitemap_root(body) {
            tracing::debug!(
                "{} answered {:?} but serves a sitemap",
                probe_url,
                result.status_code
            );
            vec![located]
        } else {
            Vec::new()
        };
    }

    // xhtml error pages carry "xml" in their type and an <?xml prolog
    if result.is_html() {
        if has_sitemap_root(body) {
            return vec![located];
        }
        return match Url::parse(&located) {
            Ok(base) => extract_sitemap_anchors(body, &base),
            Err(_) => Vec::new(),
        };
    }

    let content_type = result.content_type.to_ascii_lowercase();
    if content_type.contains("xml") || has_sitemap_signature(body) {
        return vec![located];
    }

    if content_type.starts_with("text/plain") || content_type.is_empty() {
        let mut found = find_sitemap_urls(body);
        if found.is_empty() && !extract_heuristic(body).is_empty() {
            found.push(located);
        }
        return found;
    }

    Vec::new()
}
