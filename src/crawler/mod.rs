//! Crawler module for page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching
//! - Link extraction and page classification
//! - Worklist scheduling and the politeness delay
//! - Overall crawl coordination

mod classifier;
mod coordinator;
mod fetcher;
mod links;
mod scheduler;

pub use classifier::{classify, is_product_page, Classification, ClassificationReason};
pub use coordinator::{Coordinator, CrawlReport};
pub use fetcher::{build_http_client, fetch_url, FetchError, FetchErrorKind, FetchResult};
pub use links::{
    extract_links, is_product_url, listing_kind, listing_label, product_link_count, ListingKind,
    PageLinks,
};
pub use scheduler::Scheduler;

use crate::config::Config;
use crate::Result;

/// Runs a complete crawl operation
///
/// This is the main entry point for a crawl without progress reporting or
/// cancellation. It will:
/// 1. Fetch the homepage and collect category and brand listings
/// 2. Scan every listing and its pagination for product links
/// 3. Scrape each discovered product page
/// 4. Write the dataset to the configured outputs
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The dataset and run statistics
/// * `Err(SweepError)` - The homepage was unreachable or an output failed
///
/// # Example
///
/// ```no_run
/// use shelf_sweep::config::load_config;
/// use shelf_sweep::crawler::crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("shelf-sweep.toml"))?;
/// let report = crawl(config).await?;
/// println!("{} products", report.dataset.total_products);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config) -> Result<CrawlReport> {
    Coordinator::new(config)?.run().await
}
