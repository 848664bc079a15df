use crate::product::{Dataset, Product};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Category and brand attributed to a product URL by the listing page that
/// linked to it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkMetadata {
    pub category: Option<String>,
    pub brand: Option<String>,
}

/// Result of offering a product to the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The product was new and has been stored
    Inserted,
    /// Another product already has this URL
    DuplicateUrl,
    /// Another product already has this non-empty SKU
    DuplicateSku,
}

impl InsertOutcome {
    pub fn is_duplicate(&self) -> bool {
        !matches!(self, Self::Inserted)
    }
}

/// Counters collected during a crawl run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStats {
    /// Every page fetched successfully, listing and product pages alike
    pub pages_scanned: u64,

    /// Listing pages (category, brand, pagination) fetched successfully
    pub categories_scanned: u64,

    /// Failed fetches
    pub errors: u64,

    /// Products discarded because their URL or SKU was already stored
    pub duplicates_skipped: u64,

    /// Worklist pages the classifier judged to be listings
    pub non_product_pages: u64,

    /// Product pages whose extraction produced no valid record
    pub invalid_products: u64,

    /// Size of the product worklist built at the end of discovery
    pub worklist_size: u64,

    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Whether the run stopped early on cancellation
    pub cancelled: bool,
}

impl CrawlStats {
    /// Pages that produced no product, whatever the reason
    pub fn skipped(&self) -> u64 {
        self.non_product_pages + self.invalid_products
    }

    /// Run duration in seconds, once both timestamps are known
    pub fn duration_seconds(&self) -> Option<i64> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some((end - start).num_seconds()),
            _ => None,
        }
    }
}

/// All mutable state of one crawl run
///
/// Owned by the coordinator and never shared with the fetch/extract
/// components, which only return values.
#[derive(Debug, Default)]
pub struct CrawlState {
    /// URLs already fetched
    visited: HashSet<String>,

    /// Product URLs waiting to be scraped, in discovery order
    discovered: Vec<String>,
    discovered_set: HashSet<String>,

    /// Attribution gathered from listing pages
    link_metadata: HashMap<String, LinkMetadata>,

    /// Accepted products, in insertion order
    products: Vec<Product>,

    categories: BTreeSet<String>,
    brands: BTreeSet<String>,

    pub stats: CrawlStats,
}

impl CrawlState {
    /// Creates an empty state stamped with the current time
    pub fn new() -> Self {
        Self {
            stats: CrawlStats {
                started_at: Some(Utc::now()),
                ..CrawlStats::default()
            },
            ..Self::default()
        }
    }

    /// Marks a URL as fetched; returns false if it already was
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Records a product URL found on a listing page
    ///
    /// Returns true when the URL had not been discovered before.
    pub fn discover(&mut self, url: &str) -> bool {
        if self.discovered_set.insert(url.to_string()) {
            self.discovered.push(url.to_string());
            true
        } else {
            false
        }
    }

    pub fn discovered_count(&self) -> usize {
        self.discovered.len()
    }

    /// Attributes a category and/or brand to a product URL
    ///
    /// The first listing page to attribute a field wins; later pages only fill
    /// fields that are still empty.
    pub fn attribute(&mut self, url: &str, category: Option<&str>, brand: Option<&str>) {
        let entry = self.link_metadata.entry(url.to_string()).or_default();
        if entry.category.is_none() {
            entry.category = category.filter(|c| !c.is_empty()).map(str::to_string);
        }
        if entry.brand.is_none() {
            entry.brand = brand.filter(|b| !b.is_empty()).map(str::to_string);
        }
    }

    pub fn metadata_for(&self, url: &str) -> Option<&LinkMetadata> {
        self.link_metadata.get(url)
    }

    /// Builds the scraping worklist: discovered product URLs not yet fetched,
    /// each exactly once, in discovery order
    pub fn worklist(&self) -> Vec<String> {
        self.discovered
            .iter()
            .filter(|url| !self.visited.contains(*url))
            .cloned()
            .collect()
    }

    /// Stores a product unless it duplicates an accumulated one
    ///
    /// A duplicate has the same URL, or the same non-empty SKU, as a product
    /// already stored. Duplicates leave the accumulator untouched and bump
    /// `duplicates_skipped`.
    pub fn insert_product(&mut self, product: Product) -> InsertOutcome {
        let sku = product.sku.trim();

        for existing in &self.products {
            if existing.url == product.url {
                self.stats.duplicates_skipped += 1;
                return InsertOutcome::DuplicateUrl;
            }
            if !sku.is_empty() && existing.sku.trim() == sku {
                self.stats.duplicates_skipped += 1;
                return InsertOutcome::DuplicateSku;
            }
        }

        if !product.category.is_empty() {
            self.categories.insert(product.category.clone());
        }
        if !product.brand.is_empty() {
            self.brands.insert(product.brand.clone());
        }
        self.products.push(product);
        InsertOutcome::Inserted
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn categories(&self) -> impl Iterator<Item = &String> {
        self.categories.iter()
    }

    pub fn brands(&self) -> impl Iterator<Item = &String> {
        self.brands.iter()
    }

    /// Consumes the state, producing the output dataset and final statistics
    pub fn into_dataset(mut self) -> (Dataset, CrawlStats) {
        let finished = Utc::now();
        self.stats.finished_at = Some(finished);

        let dataset = Dataset::new(
            self.products,
            self.categories.into_iter().collect(),
            self.brands.into_iter().collect(),
            finished,
        );
        (dataset, self.stats)
    }
}
