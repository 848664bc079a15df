//! Product field extraction
//!
//! Every field is resolved by an ordered list of strategies. A strategy is a
//! plain function from a [`ProductPage`] to an optional value; the first
//! strategy that returns `Some` wins. Images are the exception: all image
//! sources are merged.
//!
//! Strategies never touch crawl state and never fail; they only inspect the
//! parsed document.

pub mod description;
pub mod identity;
pub mod images;
pub mod price;
pub mod stock;
pub mod structured;
pub mod taxonomy;

use crate::config::ExtractionConfig;
use crate::html::primary_heading;
use crate::product::{is_valid_product_name, Product};
use scraper::Html;
use serde_json::Value;
use url::Url;

/// A parsed product page and what is already known about it
pub struct ProductPage<'a> {
    pub document: &'a Html,
    pub url: &'a Url,
    /// Text of the primary heading
    pub heading: Option<String>,
    /// Embedded schema.org Product, if any
    pub structured: Option<Value>,
    pub known_brands: &'a [String],
    /// Resolved product name; empty until identity extraction has run
    pub name: String,
}

impl<'a> ProductPage<'a> {
    pub fn new(document: &'a Html, url: &'a Url, known_brands: &'a [String]) -> Self {
        Self {
            document,
            url,
            heading: primary_heading(document),
            structured: structured::json_ld_product(document),
            known_brands,
            name: String::new(),
        }
    }
}

/// One way of reading a field from a page
pub type Strategy<T> = fn(&ProductPage<'_>) -> Option<T>;

/// Runs strategies in order and returns the first value found
pub fn first_of<T>(page: &ProductPage<'_>, strategies: &[Strategy<T>]) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(page))
}

/// Builds a [`Product`] from a page already classified as a product page
#[derive(Debug, Clone)]
pub struct ProductExtractor {
    known_brands: Vec<String>,
    default_inventory: u32,
}

impl ProductExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            known_brands: config.known_brands.clone(),
            default_inventory: config.default_inventory,
        }
    }

    /// Extracts a product record
    ///
    /// # Returns
    ///
    /// * `Some(Product)` - the page yielded a product with a valid name
    /// * `None` - no usable name was found; the page is counted as invalid
    ///
    /// Health categories are left empty for the caller to fill.
    pub fn extract(&self, document: &Html, url: &Url) -> Option<Product> {
        let mut page = ProductPage::new(document, url, &self.known_brands);

        let name = first_of(&page, identity::NAME_STRATEGIES)?;
        if !is_valid_product_name(&name) {
            tracing::debug!("Rejected product name {:?} on {}", name, url);
            return None;
        }
        page.name = name;

        let sku = identity::extract_sku(&page);
        let price = first_of(&page, price::PRICE_STRATEGIES).unwrap_or(0.0);
        let compare_price = price::compare_price(&page, price);
        let description = first_of(&page, description::DESCRIPTION_STRATEGIES)
            .map(|text| description::cap_description(&text))
            .unwrap_or_default();
        let short_description = description::short_description(&page, &description);

        let images = images::extract_images(&page);
        let brand = first_of(&page, taxonomy::BRAND_STRATEGIES).unwrap_or_default();
        let category = first_of(&page, taxonomy::CATEGORY_STRATEGIES).unwrap_or_default();

        let inventory_quantity =
            first_of(&page, stock::INVENTORY_STRATEGIES).unwrap_or(self.default_inventory);
        let weight = first_of(&page, stock::WEIGHT_STRATEGIES).unwrap_or_default();
        let ingredients = first_of(&page, stock::INGREDIENT_STRATEGIES).unwrap_or_default();

        Some(Product {
            url: url.to_string(),
            sku,
            name: page.name,
            price,
            compare_price,
            description,
            short_description,
            brand,
            category,
            images,
            in_stock: inventory_quantity > 0,
            inventory_quantity,
            weight,
            ingredients,
            health_categories: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ProductExtractor {
        ProductExtractor::new(&ExtractionConfig {
            known_brands: vec!["Leafwise".to_string(), "Leafwise Organics".to_string()],
            default_inventory: 100,
        })
    }

    fn url() -> Url {
        Url::parse("https://shop.example.com/product/valid-herb-tea/").unwrap()
    }

    #[test]
    fn test_extract_full_page() {
        let html = r#"<html><head><title>Valid Herb Tea | Example Shop</title></head><body>
            <nav class="breadcrumb"><a href="/">Home</a><a href="/category/herbal-teas/">Herbal Teas</a></nav>
            <div class="product-detail">
              <h1>Valid Herb Tea SKU: 100</h1>
              <p class="price"><del>$12.50</del> <ins>$9.99</ins></p>
              <div class="product-gallery"><img src="/img/tea.jpg" alt="Tea tin"></div>
              <div class="product-description"><p>A calming chamomile blend by Leafwise Organics. Steep for five minutes.</p></div>
              <p class="stock in-stock">14 in stock</p>
              <table class="product-attributes"><tr><th>Weight</th><td>100 g</td></tr></table>
            </div>
        </body></html>"#;
        let doc = Html::parse_document(html);
        let product = extractor().extract(&doc, &url()).unwrap();

        assert_eq!(product.name, "Valid Herb Tea");
        assert_eq!(product.sku, "100");
        assert_eq!(product.price, 9.99);
        assert_eq!(product.compare_price, Some(12.5));
        assert_eq!(product.category, "Herbal Teas");
        assert_eq!(product.inventory_quantity, 14);
        assert!(product.in_stock);
        assert_eq!(product.weight, "100 g");
        assert_eq!(product.images.len(), 1);
        assert_eq!(product.images[0].url, "https://shop.example.com/img/tea.jpg");
        assert_eq!(
            product.short_description,
            "A calming chamomile blend by Leafwise Organics."
        );
        assert!(product.health_categories.is_empty());
    }

    #[test]
    fn test_generic_name_rejected() {
        let doc = Html::parse_document("<html><body><h1>Shop</h1></body></html>");
        assert!(extractor().extract(&doc, &url()).is_none());
    }

    #[test]
    fn test_missing_fields_default() {
        let doc = Html::parse_document("<html><body><h1>Lavender Calm Tea</h1></body></html>");
        let product = extractor().extract(&doc, &url()).unwrap();

        assert_eq!(product.price, 0.0);
        assert_eq!(product.sku, "VALID-HERB-TEA");
        assert_eq!(product.inventory_quantity, 100);
        assert!(product.images.is_empty());
        assert_eq!(product.brand, "");
    }
}
