//! Fallback crawler
//!
//! A bounded breadth-first crawl of one site, used when no usable sitemap
//! exists. The frontier is processed in batches no wider than the worker
//! pool, the number of visited pages never exceeds the page budget, and the
//! pending queue never holds more than twice that budget.

use crate::crawler::fetcher::FetchClient;
use crate::crawler::parser::{parse_html, truncate_description};
use crate::output::CrawlPageRecord;
use crate::robots::ParsedRobots;
use crate::url::{normalize_url, same_domain};
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use url::Url;

/// Robots rules applied to discovered links
#[derive(Debug, Clone)]
pub struct RobotsFilter {
    pub robots: ParsedRobots,
    /// Product token matched against robots.txt groups
    pub agent: String,
}

impl RobotsFilter {
    fn allows(&self, url: &str) -> bool {
        self.robots.is_allowed(url, &self.agent)
    }
}

/// Outcome of a crawl with its bookkeeping figures
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// One record per visited page, in visit order
    pub pages: Vec<CrawlPageRecord>,
    /// Largest size the pending queue reached
    pub peak_pending: usize,
    /// Links skipped because robots.txt disallows them
    pub disallowed: usize,
}

/// What one page visit produced
struct Visit {
    record: CrawlPageRecord,
    final_url: Option<String>,
    links: Vec<String>,
}

/// Breadth-first same-domain crawler
pub struct FallbackCrawler {
    client: Arc<FetchClient>,
    description_length: usize,
}

impl FallbackCrawler {
    pub fn new(client: Arc<FetchClient>, description_length: usize) -> Self {
        Self {
            client,
            description_length,
        }
    }

    /// Crawls from `base_url`, visiting at most `max_pages` pages
    pub async fn crawl(
        &self,
        base_url: &Url,
        max_pages: usize,
        robots: Option<&RobotsFilter>,
    ) -> Vec<CrawlPageRecord> {
        self.crawl_detailed(base_url, max_pages, robots).await.pages
    }

    /// Crawls like [`crawl`](Self::crawl) and also reports queue figures
    ///
    /// # Crawl Flow
    ///
    /// 1. Seed the queue with the normalized base URL
    /// 2. Take a batch of `min(pool width, pages left)` URLs off the queue
    /// 3. Fetch the batch on the worker pool
    /// 4. Record every page, errored ones included
    /// 5. Queue unseen same-domain links while the queue has room
    /// 6. Stop at the page budget or when the queue runs dry
    pub async fn crawl_detailed(
        &self,
        base_url: &Url,
        max_pages: usize,
        robots: Option<&RobotsFilter>,
    ) -> CrawlReport {
        let mut report = CrawlReport::default();
        if max_pages == 0 {
            return report;
        }

        let pending_cap = max_pages.saturating_mul(2);
        let pool = self.client.governor().pool();

        let start = match normalize_url(base_url.as_str()) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::warn!("Cannot crawl {}: {}", base_url, e);
                return report;
            }
        };

        let mut visited: HashSet<String> = HashSet::new();
        let mut queued: HashSet<String> = HashSet::from([start.clone()]);
        let mut pending: VecDeque<String> = VecDeque::from([start]);
        report.peak_pending = 1;

        tracing::info!("Crawling {} (up to {} pages)", base_url, max_pages);

        while !pending.is_empty() && report.pages.len() < max_pages {
            let batch_size = pool.width().min(max_pages - report.pages.len());
            let batch: Vec<String> = pending.drain(..batch_size.min(pending.len())).collect();
            for url in &batch {
                queued.remove(url);
                visited.insert(url.clone());
            }

            let visits = pool.run_all(batch, |url| self.visit(url)).await;

            for visit in visits {
                report.pages.push(visit.record);
                if let Some(final_url) = visit.final_url {
                    visited.insert(final_url);
                }

                for link in visit.links {
                    if pending.len() >= pending_cap {
                        break;
                    }
                    let Ok(parsed) = Url::parse(&link) else {
                        continue;
                    };
                    if !same_domain(base_url, &parsed)
                        || visited.contains(&link)
                        || queued.contains(&link)
                    {
                        continue;
                    }
                    if let Some(filter) = robots {
                        if !filter.allows(&link) {
                            report.disallowed += 1;
                            continue;
                        }
                    }
                    queued.insert(link.clone());
                    pending.push_back(link);
                }
                report.peak_pending = report.peak_pending.max(pending.len());
            }

            tracing::debug!(
                "Crawl progress: {} visited, {} pending",
                report.pages.len(),
                pending.len()
            );
        }

        tracing::info!(
            "Crawl of {} finished with {} page(s)",
            base_url,
            report.pages.len()
        );
        if report.disallowed > 0 {
            tracing::debug!(
                "Skipped {} link(s) disallowed by robots.txt",
                report.disallowed
            );
        }
        report
    }

    /// Fetches one page and extracts its description and links
    async fn visit(&self, url: String) -> Visit {
        let result = self.client.get(&url).await;

        let mut record = CrawlPageRecord {
            loc: url.clone(),
            status_code: result.status_code,
            meta_description: None,
            error: None,
        };

        if !result.success {
            record.error = Some(
                result
                    .error
                    .clone()
                    .unwrap_or_else(|| "fetch failed".to_string()),
            );
            return Visit {
                record,
                final_url: None,
                links: Vec::new(),
            };
        }

        let final_url = normalize_url(&result.final_url)
            .map(|u| u.to_string())
            .ok()
            .filter(|u| *u != url);

        let mut links = Vec::new();
        if result.is_html() {
            let page_url = Url::parse(&result.final_url)
                .or_else(|_| Url::parse(&url))
                .ok();
            if let Some(page_url) = page_url {
                let parsed = parse_html(&result.content, &page_url);
                record.meta_description = parsed
                    .description
                    .map(|d| truncate_description(&d, self.description_length));
                links = parsed
                    .links
                    .iter()
                    .filter_map(|link| normalize_url(link).ok())
                    .map(|u| u.to_string())
                    .collect();
            }
        }

        Visit {
            record,
            final_url,
            links,
        }
    }
}
