//! Scheduler for the product scraping worklist
//!
//! This module handles:
//! - The shared queue of product URLs, handed out in discovery order
//! - Global concurrency limiting via a semaphore
//! - The politeness delay each worker observes between its own fetches

use crate::config::CrawlerConfig;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// A product URL queued for fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// The normalized product URL
    pub url: String,

    /// Position in the worklist, starting at 0
    pub position: usize,
}

/// A scheduled fetch with a semaphore permit
///
/// The permit is released when the fetch is dropped.
pub struct ScheduledFetch {
    /// The URL to fetch
    pub url: QueuedUrl,

    /// The semaphore permit for this fetch
    pub _permit: OwnedSemaphorePermit,
}

/// Scheduler hands worklist URLs to workers
///
/// The scheduler coordinates:
/// - Global concurrency limits (at most `workers` requests in flight)
/// - Worklist order (first discovered, first fetched; each URL exactly once)
/// - The per-worker politeness delay
///
/// It is shared by reference between all workers of one crawl.
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    semaphore: Arc<Semaphore>,

    /// URLs not yet handed out
    queue: Mutex<VecDeque<QueuedUrl>>,

    /// Worklist size fixed at construction
    total: usize,

    workers: usize,

    politeness_delay: Duration,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `worklist` - Deduplicated product URLs in discovery order
    ///
    /// # Returns
    ///
    /// A new Scheduler instance
    pub fn new(config: &CrawlerConfig, worklist: Vec<String>) -> Self {
        let workers = (config.workers as usize).max(1);
        let total = worklist.len();
        let queue = worklist
            .into_iter()
            .enumerate()
            .map(|(position, url)| QueuedUrl { url, position })
            .collect();

        Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            queue: Mutex::new(queue),
            total,
            workers,
            politeness_delay: config.politeness_delay(),
        }
    }

    /// Gets the next URL to fetch
    ///
    /// # Returns
    ///
    /// * `Some(ScheduledFetch)` - A URL and the permit to fetch it
    /// * `None` - The worklist is exhausted or the semaphore was closed
    pub async fn next_url(&self) -> Option<ScheduledFetch> {
        let permit = self.semaphore.clone().acquire_owned().await.ok()?;

        let next = match self.queue.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(poisoned) => poisoned.into_inner().pop_front(),
        }?;

        tracing::trace!("Scheduling {} ({}/{})", next.url, next.position + 1, self.total);
        Some(ScheduledFetch {
            url: next,
            _permit: permit,
        })
    }

    /// Waits out the politeness delay, returning early on cancellation
    ///
    /// # Returns
    ///
    /// * `true` - The delay elapsed
    /// * `false` - The crawl was cancelled while waiting
    pub async fn pause(&self, cancel: &CancellationToken) -> bool {
        politeness_pause(self.politeness_delay, cancel).await
    }

    /// Number of URLs not yet handed out
    pub fn remaining(&self) -> usize {
        match self.queue.lock() {
            Ok(queue) => queue.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Worklist size at construction
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of workers the pool should run
    pub fn workers(&self) -> usize {
        self.workers
    }
}

/// Sleeps for `delay` unless the crawl is cancelled first
pub(crate) async fn politeness_pause(delay: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if delay.is_zero() {
        return true;
    }

    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
