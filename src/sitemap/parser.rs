//! Sitemap parser
//!
//! Resolves sitemap indexes into URL records with an explicit worklist.
//! Every sitemap URL is fetched at most once per call: the processed set is
//! checked before a URL is fetched and again before a child is queued, so
//! indexes that list themselves or each other terminate.

use crate::crawler::{extract_meta_description, truncate_description, FetchClient};
use crate::output::SitemapUrlRecord;
use crate::sitemap::extract::{
    extract_child_sitemaps, extract_leaf_entries, has_sitemap_root, is_index_document,
};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use url::Url;

/// Settings for description enrichment
#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Fetch listed pages to fill in missing descriptions
    pub enabled: bool,
    /// Most entries fetched per call
    pub limit: usize,
    /// Truncation length of a description, in characters
    pub description_length: usize,
    /// Retry budget of each page fetch
    pub max_retries: u32,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            limit: 200,
            description_length: 500,
            max_retries: 1,
        }
    }
}

/// Turns sitemap URLs into deduplicated URL records
pub struct SitemapParser {
    client: Arc<FetchClient>,
    enrich: EnrichOptions,
}

impl SitemapParser {
    pub fn new(client: Arc<FetchClient>, enrich: EnrichOptions) -> Self {
        Self { client, enrich }
    }

    /// Resolves `sitemap_urls` (indexes and leaves) into described URL records
    ///
    /// Same as [`SitemapParser::collect`] followed by [`SitemapParser::enrich`].
    pub async fn parse(&self, sitemap_urls: &[String]) -> Vec<SitemapUrlRecord> {
        let mut records = self.collect(sitemap_urls).await;
        self.enrich(&mut records).await;
        records
    }

    /// Walks `sitemap_urls` (indexes and leaves) into URL records
    ///
    /// Documents that cannot be fetched are skipped. Records come back in
    /// document order with unique `loc` values. No page is fetched for a
    /// description.
    pub async fn collect(&self, sitemap_urls: &[String]) -> Vec<SitemapUrlRecord> {
        let mut queue: VecDeque<String> = sitemap_urls.iter().cloned().collect();
        let mut processed: HashSet<String> = HashSet::new();
        let mut seen_locs: HashSet<String> = HashSet::new();
        let mut records = Vec::new();

        while let Some(sitemap_url) = queue.pop_front() {
            if !processed.insert(sitemap_url.clone()) {
                tracing::debug!("Skipping already processed sitemap {}", sitemap_url);
                continue;
            }

            let result = self.client.get(&sitemap_url).await;
            let usable = result.success
                || (result.status_code.is_some() && has_sitemap_root(&result.content));
            if !usable {
                tracing::warn!(
                    "Could not read sitemap {}: {}",
                    sitemap_url,
                    result.error.as_deref().unwrap_or("unknown error")
                );
                continue;
            }
            if !result.final_url.is_empty() {
                processed.insert(result.final_url.clone());
            }

            if is_index_document(&sitemap_url, &result.content) {
                let children = extract_child_sitemaps(&result.content);
                tracing::debug!("Sitemap index {} lists {} children", sitemap_url, children.len());

                for child in children {
                    let Some(child) = resolve(&sitemap_url, &child) else {
                        continue;
                    };
                    if processed.contains(&child) || queue.contains(&child) {
                        tracing::debug!("Not revisiting {}", child);
                        continue;
                    }
                    queue.push_back(child);
                }
            } else {
                let entries = extract_leaf_entries(&result.content);
                let before = records.len();
                for mut entry in entries {
                    let Some(loc) = resolve(&sitemap_url, &entry.loc) else {
                        continue;
                    };
                    if seen_locs.insert(loc.clone()) {
                        entry.loc = loc;
                        records.push(entry);
                    }
                }
                tracing::debug!(
                    "Sitemap {} contributed {} new URL(s)",
                    sitemap_url,
                    records.len() - before
                );
            }
        }

        tracing::info!(
            "Parsed {} sitemap document(s) into {} URL(s)",
            processed.len(),
            records.len()
        );

        records
    }

    /// Fills in missing descriptions by fetching the listed pages
    ///
    /// Does nothing when enrichment is disabled. Failures only leave the
    /// field empty.
    pub async fn enrich(&self, records: &mut [SitemapUrlRecord]) {
        if !self.enrich.enabled {
            return;
        }
        let targets: Vec<(usize, String)> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.meta_description.is_none())
            .take(self.enrich.limit)
            .map(|(i, r)| (i, r.loc.clone()))
            .collect();
        if targets.is_empty() {
            return;
        }

        tracing::debug!("Fetching descriptions for {} URL(s)", targets.len());
        let pool = self.client.governor().pool();
        let described = pool
            .run_all(targets, |(index, loc)| async move {
                (index, self.describe(&loc).await)
            })
            .await;

        let mut filled = 0;
        for (index, description) in described {
            if let (Some(description), Some(record)) = (description, records.get_mut(index)) {
                record.meta_description = Some(description);
                filled += 1;
            }
        }
        tracing::debug!("Filled {} description(s)", filled);
    }

    async fn describe(&self, url: &str) -> Option<String> {
        let result = self.client.fetch(url, self.enrich.max_retries).await;
        if !result.success || !(result.is_html() || result.content_type.is_empty()) {
            return None;
        }
        extract_meta_description(&result.content)
            .map(|d| truncate_description(&d, self.enrich.description_length))
    }
}

/// Resolves a possibly relative URL against the document it came from
fn resolve(document_url: &str, url: &str) -> Option<String> {
    let url = url.trim();
    if url.is_empty() {
        return None;
    }
    match Url::parse(url) {
        Ok(absolute) => Some(absolute.to_string()),
        Err(_) => Url::parse(document_url)
            .and_then(|base| base.join(url))
            .ok()
            .map(|u| u.to_string()),
    }
}
