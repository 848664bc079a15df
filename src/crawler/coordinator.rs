//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl state machine, which drives a run through:
//! - Fetching the homepage and collecting category and brand listings
//! - Scanning each listing and following its pagination
//! - Scraping the product worklist with a bounded worker pool
//! - Handing the finished dataset to the output handlers
//!
//! Only the coordinator mutates [`CrawlState`]. Workers fetch, classify and
//! extract, then send their outcome back over a channel.

use crate::categorize::categorize;
use crate::config::{ClassifierConfig, Config};
use crate::crawler::classifier::{classify, ClassificationReason};
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchError, FetchResult};
use crate::crawler::links::{extract_links, listing_kind, listing_label, ListingKind};
use crate::crawler::scheduler::{politeness_pause, Scheduler};
use crate::extract::ProductExtractor;
use crate::output::{handlers_from_config, BoxedOutput};
use crate::product::{Dataset, Product, GENERIC_TITLES};
use crate::progress::{ProgressEvent, ProgressReporter};
use crate::state::{CrawlPhase, CrawlState, CrawlStats, LinkMetadata};
use crate::url::{normalize_url, with_query_param};
use crate::{Result, SweepError};
use futures::future::join_all;
use reqwest::Client;
use scraper::Html;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Result of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub dataset: Dataset,
    pub stats: CrawlStats,
}

/// What a worker learned about one product URL
#[derive(Debug)]
enum ScrapeOutcome {
    Product { url: String, product: Box<Product> },
    NotProduct { url: String, reason: ClassificationReason },
    Invalid { url: String },
    FetchFailed { url: String, error: FetchError },
}

impl ScrapeOutcome {
    fn url(&self) -> &str {
        match self {
            Self::Product { url, .. }
            | Self::NotProduct { url, .. }
            | Self::Invalid { url }
            | Self::FetchFailed { url, .. } => url,
        }
    }
}

/// Everything a scraping worker needs, cloned out of the coordinator
struct WorkerContext {
    client: Client,
    classifier: ClassifierConfig,
    extractor: ProductExtractor,
    cancel: CancellationToken,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    client: Client,
    base_url: Url,
    extractor: ProductExtractor,
    state: CrawlState,
    phase: CrawlPhase,
    progress: ProgressReporter,
    cancel: CancellationToken,
    outputs: Vec<BoxedOutput>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// The configuration is used as given; [`crate::config::load_config`]
    /// is where validation happens. Output handlers for every path set in
    /// the `[output]` section are installed.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SweepError)` - The base URL is unusable or the HTTP client
    ///   could not be built
    pub fn new(config: Config) -> Result<Self> {
        let base_url = normalize_url(&config.site.base_url)?;
        let client = build_http_client(&config)?;
        let extractor = ProductExtractor::new(&config.extraction);
        let outputs = handlers_from_config(&config.output);

        Ok(Self {
            config,
            client,
            base_url,
            extractor,
            state: CrawlState::new(),
            phase: CrawlPhase::Init,
            progress: ProgressReporter::disabled(),
            cancel: CancellationToken::new(),
            outputs,
        })
    }

    /// Publishes progress events on `sender`
    pub fn with_progress(mut self, sender: mpsc::Sender<ProgressEvent>) -> Self {
        self.progress = ProgressReporter::new(sender);
        self
    }

    /// Stops the crawl when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Adds an output handler, run after those from the configuration
    pub fn with_output(mut self, output: BoxedOutput) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Runs the crawl to completion
    ///
    /// On failure the coordinator moves to the `Error` phase and publishes
    /// an error event before returning the error.
    pub async fn run(mut self) -> Result<CrawlReport> {
        tracing::info!("Starting crawl of {}", self.base_url);
        self.report(format!("Starting crawl of {}", self.base_url), 0, 0);

        match self.execute().await {
            Ok(report) => Ok(report),
            Err(e) => {
                tracing::error!("Crawl failed during {}: {}", self.phase, e);
                if self.phase.can_transition_to(CrawlPhase::Error) {
                    self.phase = CrawlPhase::Error;
                }
                self.report(e.to_string(), 0, 0);
                Err(e)
            }
        }
    }

    async fn execute(&mut self) -> Result<CrawlReport> {
        self.discover().await?;
        self.scrape().await?;
        self.save()
    }

    /// Moves to `next`, rejecting transitions the state machine forbids
    fn transition(&mut self, next: CrawlPhase) -> Result<()> {
        if !self.phase.can_transition_to(next) {
            return Err(SweepError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        tracing::debug!("Phase {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Like `transition`, but staying in the current phase is a no-op
    fn enter(&mut self, next: CrawlPhase) -> Result<()> {
        if self.phase == next {
            return Ok(());
        }
        self.transition(next)
    }

    /// Publishes an event for the current phase
    fn report(&self, message: impl Into<String>, current: usize, total: usize) {
        self.progress.report(ProgressEvent::new(
            self.phase.stage(),
            message,
            current,
            total,
            self.state.product_count(),
        ));
    }

    // ===== Discovery =====

    async fn discover(&mut self) -> Result<()> {
        self.transition(CrawlPhase::DiscoveringCategories)?;
        self.report(format!("Fetching homepage {}", self.base_url), 0, 0);

        let body = match fetch_url(&self.client, self.base_url.as_str()).await {
            FetchResult::Success { body, .. } => body,
            FetchResult::Failed(error) => {
                return Err(SweepError::HomepageUnavailable {
                    url: self.base_url.to_string(),
                    reason: error.to_string(),
                });
            }
        };
        self.state.mark_visited(self.base_url.as_str());
        self.state.stats.pages_scanned += 1;

        let listings = self.listing_urls(&body);
        tracing::info!("Found {} category and brand listings", listings.len());

        for (index, listing) in listings.iter().enumerate() {
            if self.cancel.is_cancelled() {
                tracing::info!("Crawl cancelled during discovery");
                break;
            }
            if self.state.is_visited(listing.as_str()) {
                continue;
            }

            self.enter(CrawlPhase::ScanningCategoryPages)?;
            self.scan_listing(listing).await?;

            self.report(
                format!(
                    "Scanned {} ({} product links so far)",
                    listing,
                    self.state.discovered_count()
                ),
                index + 1,
                listings.len(),
            );
        }

        Ok(())
    }

    /// Category and brand listings linked from the homepage, followed by the
    /// configured fallback paths
    fn listing_urls(&self, homepage: &str) -> Vec<Url> {
        let document = Html::parse_document(homepage);
        let mut listings: Vec<String> = extract_links(&document, &self.base_url).category_links;

        for path in &self.config.site.fallback_category_paths {
            let fallback = self
                .base_url
                .join(path)
                .ok()
                .and_then(|joined| normalize_url(joined.as_str()).ok());

            match fallback {
                Some(url) if !listings.iter().any(|l| l == url.as_str()) => {
                    listings.push(url.to_string());
                }
                Some(_) => {}
                None => tracing::warn!("Skipping unusable fallback category path {:?}", path),
            }
        }

        listings
            .iter()
            .filter_map(|listing| Url::parse(listing).ok())
            .collect()
    }

    /// Scans one listing and its pagination
    ///
    /// Pages are requested as `?{pagination_param}=2, 3, ...` until a page
    /// adds no new product links or `max_pagination_depth` pages were
    /// fetched.
    async fn scan_listing(&mut self, listing: &Url) -> Result<()> {
        let kind = listing_kind(listing);
        let label = listing_label(listing);
        let max_pages = self.config.crawler.max_pagination_depth.max(1);
        let delay = self.config.crawler.politeness_delay();

        for page in 1..=max_pages {
            if page > 1 {
                self.enter(CrawlPhase::Paginating)?;
            }
            if !politeness_pause(delay, &self.cancel).await {
                tracing::info!("Crawl cancelled while scanning {}", listing);
                break;
            }

            let page_url = if page == 1 {
                listing.clone()
            } else {
                with_query_param(listing, &self.config.site.pagination_param, &page.to_string())
            };
            if !self.state.mark_visited(page_url.as_str()) {
                break;
            }

            let body = match fetch_url(&self.client, page_url.as_str()).await {
                FetchResult::Success { body, .. } => body,
                FetchResult::Failed(error) => {
                    tracing::warn!("Listing page skipped: {}", error);
                    self.state.stats.errors += 1;
                    break;
                }
            };
            self.state.stats.pages_scanned += 1;
            if page == 1 {
                self.state.stats.categories_scanned += 1;
            }

            let added = self.record_listing_links(&body, &page_url, kind, label.as_deref());
            tracing::debug!("{} added {} new product links", page_url, added);
            if added == 0 {
                break;
            }
        }

        Ok(())
    }

    /// Records the product links of a listing page and attributes the
    /// listing's category or brand to them
    ///
    /// Returns the number of product URLs not seen before.
    fn record_listing_links(
        &mut self,
        body: &str,
        page_url: &Url,
        kind: Option<ListingKind>,
        label: Option<&str>,
    ) -> usize {
        let document = Html::parse_document(body);
        let links = extract_links(&document, page_url);

        let (category, brand) = match kind {
            Some(ListingKind::Category) => (label, None),
            Some(ListingKind::Brand) => (None, label),
            None => (None, None),
        };

        let mut added = 0;
        for link in &links.product_links {
            if self.state.discover(link) {
                added += 1;
            }
            self.state.attribute(link, category, brand);
        }
        added
    }

    // ===== Scraping =====

    async fn scrape(&mut self) -> Result<()> {
        let scheduler = Scheduler::new(&self.config.crawler, self.state.worklist());
        let total = scheduler.total();
        self.state.stats.worklist_size = total as u64;

        self.enter(CrawlPhase::ScrapingProducts)?;
        tracing::info!(
            "Scraping {} product pages with {} workers",
            total,
            scheduler.workers()
        );
        self.report(format!("Scraping {} product pages", total), 0, total);

        let ctx = WorkerContext {
            client: self.client.clone(),
            classifier: self.config.classifier.clone(),
            extractor: self.extractor.clone(),
            cancel: self.cancel.clone(),
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let workers: Vec<_> = (0..scheduler.workers())
            .map(|id| run_worker(id, &scheduler, &ctx, tx.clone()))
            .collect();
        drop(tx);

        let collect = async {
            let mut done = 0;
            while let Some(outcome) = rx.recv().await {
                done += 1;
                self.apply_outcome(outcome, done, total);
            }
        };

        tokio::join!(join_all(workers), collect);

        if scheduler.remaining() > 0 {
            tracing::info!("{} product pages left unfetched", scheduler.remaining());
        }
        Ok(())
    }

    /// Folds one worker outcome into the crawl state
    fn apply_outcome(&mut self, outcome: ScrapeOutcome, done: usize, total: usize) {
        self.state.mark_visited(outcome.url());

        let message = match outcome {
            ScrapeOutcome::Product { url, mut product } => {
                self.state.stats.pages_scanned += 1;
                backfill_metadata(&mut product, self.state.metadata_for(&url));

                let name = product.name.clone();
                let inserted = self.state.insert_product(*product);
                if inserted.is_duplicate() {
                    tracing::debug!("Skipping {} ({:?})", url, inserted);
                    format!("Skipped duplicate {}", name)
                } else {
                    format!("Extracted {}", name)
                }
            }
            ScrapeOutcome::NotProduct { url, reason } => {
                tracing::debug!("{} is not a product page: {}", url, reason);
                self.state.stats.pages_scanned += 1;
                self.state.stats.non_product_pages += 1;
                format!("Skipped non-product page {}", url)
            }
            ScrapeOutcome::Invalid { url } => {
                tracing::debug!("No valid product on {}", url);
                self.state.stats.pages_scanned += 1;
                self.state.stats.invalid_products += 1;
                format!("Skipped invalid product {}", url)
            }
            ScrapeOutcome::FetchFailed { url, error } => {
                tracing::warn!("Product page skipped: {}", error);
                self.state.stats.errors += 1;
                format!("Failed to fetch {}", url)
            }
        };

        self.report(message, done, total);
    }

    // ===== Saving =====

    fn save(&mut self) -> Result<CrawlReport> {
        self.transition(CrawlPhase::Saving)?;
        self.report("Saving dataset", 0, 0);

        let mut state = std::mem::take(&mut self.state);
        state.stats.cancelled = self.cancel.is_cancelled();
        let (dataset, stats) = state.into_dataset();

        for output in &mut self.outputs {
            tracing::debug!("Writing {} output", output.name());
            output.write(&dataset, &stats)?;
        }

        self.transition(CrawlPhase::Complete)?;
        tracing::info!(
            "Crawl {}: {} products, {} pages scanned, {} errors",
            if stats.cancelled { "cancelled" } else { "complete" },
            dataset.total_products,
            stats.pages_scanned,
            stats.errors
        );
        self.progress.report(ProgressEvent::new(
            self.phase.stage(),
            format!(
                "Found {} products in {} categories",
                dataset.total_products,
                dataset.categories.len()
            ),
            stats.worklist_size as usize,
            stats.worklist_size as usize,
            dataset.total_products,
        ));

        Ok(CrawlReport { dataset, stats })
    }
}

/// Pulls URLs from the scheduler until the worklist is empty or the crawl
/// is cancelled
async fn run_worker(
    id: usize,
    scheduler: &Scheduler,
    ctx: &WorkerContext,
    tx: mpsc::UnboundedSender<ScrapeOutcome>,
) {
    let mut fetched = 0usize;

    loop {
        if ctx.cancel.is_cancelled() {
            break;
        }
        let Some(scheduled) = scheduler.next_url().await else {
            break;
        };
        if fetched > 0 && !scheduler.pause(&ctx.cancel).await {
            break;
        }

        let outcome = scrape_product(ctx, scheduled.url.url.clone()).await;
        fetched += 1;
        if tx.send(outcome).is_err() {
            break;
        }
    }

    tracing::trace!("Worker {} finished after {} pages", id, fetched);
}

async fn scrape_product(ctx: &WorkerContext, url: String) -> ScrapeOutcome {
    match fetch_url(&ctx.client, &url).await {
        FetchResult::Success { body, .. } => {
            process_product_page(&body, url, &ctx.classifier, &ctx.extractor)
        }
        FetchResult::Failed(error) => ScrapeOutcome::FetchFailed { url, error },
    }
}

/// Classifies, extracts and tags one fetched product page
fn process_product_page(
    body: &str,
    url: String,
    classifier: &ClassifierConfig,
    extractor: &ProductExtractor,
) -> ScrapeOutcome {
    let Ok(page_url) = Url::parse(&url) else {
        return ScrapeOutcome::Invalid { url };
    };
    let document = Html::parse_document(body);

    let classification = classify(&document, classifier);
    if !classification.is_product {
        return ScrapeOutcome::NotProduct {
            url,
            reason: classification.reason,
        };
    }

    match extractor.extract(&document, &page_url) {
        Some(mut product) => {
            product.health_categories = categorize(&product.name, &product.description);
            ScrapeOutcome::Product {
                url,
                product: Box::new(product),
            }
        }
        None => ScrapeOutcome::Invalid { url },
    }
}

/// Fills an empty or generic category and brand from the listing that
/// linked the product
fn backfill_metadata(product: &mut Product, metadata: Option<&LinkMetadata>) {
    let Some(metadata) = metadata else {
        return;
    };

    if is_blank_or_generic(&product.category) {
        if let Some(category) = &metadata.category {
            product.category = category.clone();
        }
    }
    if is_blank_or_generic(&product.brand) {
        if let Some(brand) = &metadata.brand {
            product.brand = brand.clone();
        }
    }
}

fn is_blank_or_generic(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower.is_empty() || GENERIC_TITLES.contains(&lower.as_str())
}
