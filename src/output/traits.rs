//! Output handler traits and types
//!
//! This module defines the trait interface for output handlers and
//! associated data structures for crawl summaries.

use crate::product::Dataset;
use crate::state::CrawlStats;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Summary statistics for a crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    // Run metadata
    pub started_at: Option<String>,
    pub finished_at: Option<String>,
    pub duration_seconds: Option<i64>,
    pub status: String,

    // Dataset
    pub total_products: usize,
    pub categories: Vec<String>,
    pub brands: Vec<String>,
    pub in_stock: usize,
    pub out_of_stock: usize,

    // Products per category, uncategorized products under ""
    pub products_per_category: BTreeMap<String, usize>,

    // Crawl counters
    pub pages_scanned: u64,
    pub categories_scanned: u64,
    pub worklist_size: u64,
    pub errors: u64,
    pub duplicates_skipped: u64,
    pub non_product_pages: u64,
    pub invalid_products: u64,
}

impl CrawlSummary {
    /// Builds a summary from a finished run
    pub fn from_run(dataset: &Dataset, stats: &CrawlStats) -> Self {
        let mut products_per_category = BTreeMap::new();
        for product in &dataset.products {
            *products_per_category
                .entry(product.category.clone())
                .or_insert(0) += 1;
        }
        let in_stock = dataset.products.iter().filter(|p| p.in_stock).count();

        Self {
            started_at: stats.started_at.map(|t| t.to_rfc3339()),
            finished_at: stats.finished_at.map(|t| t.to_rfc3339()),
            duration_seconds: stats.duration_seconds(),
            status: if stats.cancelled {
                "cancelled".to_string()
            } else {
                "complete".to_string()
            },
            total_products: dataset.total_products,
            categories: dataset.categories.clone(),
            brands: dataset.brands.clone(),
            in_stock,
            out_of_stock: dataset.products.len() - in_stock,
            products_per_category,
            pages_scanned: stats.pages_scanned,
            categories_scanned: stats.categories_scanned,
            worklist_size: stats.worklist_size,
            errors: stats.errors,
            duplicates_skipped: stats.duplicates_skipped,
            non_product_pages: stats.non_product_pages,
            invalid_products: stats.invalid_products,
        }
    }

    /// Returns the share of worklist URLs that became products, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.worklist_size == 0 {
            return 0.0;
        }
        (self.total_products as f64 / self.worklist_size as f64) * 100.0
    }

    /// Returns the share of fetches that failed, as a percentage
    pub fn error_rate(&self) -> f64 {
        let attempted = self.pages_scanned + self.errors;
        if attempted == 0 {
            return 0.0;
        }
        (self.errors as f64 / attempted as f64) * 100.0
    }
}

/// Trait for output handlers
///
/// An output handler receives the finished dataset once, during the Saving
/// phase. A handler error aborts the crawl.
pub trait OutputHandler {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Writes the dataset
    ///
    /// # Arguments
    ///
    /// * `dataset` - The products, categories and brands of the run
    /// * `stats` - The run's counters
    fn write(&mut self, dataset: &Dataset, stats: &CrawlStats) -> OutputResult<()>;
}
