//! Bounded worker pool shared by every parallel stage
//!
//! Locator probes, sitemap description enrichment and fallback crawl batches
//! all run through the same pool, so the number of requests in flight from
//! one governor never exceeds the pool width.

use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Fixed-width pool of concurrent work slots
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    width: usize,
}

impl WorkerPool {
    /// Creates a pool that runs at most `width` jobs at once
    pub fn new(width: usize) -> Self {
        let width = width.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(width)),
            width,
        }
    }

    /// Returns the pool width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of slots currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Runs `job` for every item and waits for all of them
    ///
    /// At most `width` jobs run at the same time across every caller of this
    /// pool. Results come back in input order.
    pub async fn run_all<I, F, Fut, T>(&self, items: I, job: F) -> Vec<T>
    where
        I: IntoIterator,
        F: Fn(I::Item) -> Fut,
        Fut: Future<Output = T>,
    {
        let jobs = items.into_iter().map(|item| {
            let semaphore = Arc::clone(&self.semaphore);
            let work = job(item);
            async move {
                // the semaphore is never closed, so a permit always arrives
                let _permit = semaphore.acquire_owned().await.ok();
                work.await
            }
        });

        join_all(jobs).await
    }
}
