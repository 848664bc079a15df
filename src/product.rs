//! Product records and the dataset handed to output writers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound for a believable product price
pub const MAX_PRICE: f64 = 10_000.0;

/// Lower bound for a believable product price
pub const MIN_PRICE: f64 = 0.01;

/// Minimum length of a product name
pub const MIN_NAME_LEN: usize = 5;

/// Titles that only ever appear on listing pages
///
/// A product carrying one of these as its name means the classifier accepted
/// a listing page.
pub const GENERIC_TITLES: &[&str] = &[
    "shop",
    "products",
    "product",
    "home",
    "store",
    "catalog",
    "catalogue",
    "all products",
    "featured products",
    "new arrivals",
    "best sellers",
    "sale",
    "search results",
    "categories",
    "brands",
    "page not found",
];

/// Returns true when `name` is usable as a product name
pub fn is_valid_product_name(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_NAME_LEN {
        return false;
    }
    let lower = trimmed.to_lowercase();
    !GENERIC_TITLES.contains(&lower.as_str())
}

/// Returns true when `price` falls inside the accepted range
pub fn is_plausible_price(price: f64) -> bool {
    price.is_finite() && (MIN_PRICE..=MAX_PRICE).contains(&price)
}

/// A product image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    /// Absolute image URL
    pub url: String,
    pub alt_text: String,
}

/// A product extracted from a single product page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Page the product was extracted from, unique per source
    pub url: String,
    pub sku: String,
    pub name: String,
    /// Current selling price, 0 when none could be read
    pub price: f64,
    /// Regular price shown struck through next to a sale price
    pub compare_price: Option<f64>,
    pub description: String,
    pub short_description: String,
    pub brand: String,
    pub category: String,
    pub images: Vec<ProductImage>,
    pub in_stock: bool,
    pub inventory_quantity: u32,
    /// Free-text magnitude and unit, e.g. "60 capsules" or "250 g"
    pub weight: String,
    pub ingredients: String,
    pub health_categories: Vec<String>,
}

/// The final normalized crawl output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub products: Vec<Product>,
    pub categories: Vec<String>,
    pub brands: Vec<String>,
    pub scraped_at: DateTime<Utc>,
    pub total_products: usize,
}

impl Dataset {
    /// Builds a dataset, deriving the total from the product list
    pub fn new(
        products: Vec<Product>,
        categories: Vec<String>,
        brands: Vec<String>,
        scraped_at: DateTime<Utc>,
    ) -> Self {
        let total_products = products.len();
        Self {
            products,
            categories,
            brands,
            scraped_at,
            total_products,
        }
    }
}
