//! Product page classification
//!
//! Decides whether a fetched page shows a single product. Listing pages
//! (categories, brands, search results) are routinely linked with product
//! URLs, so every page in the worklist goes through here before extraction.
//!
//! # Decision Order
//!
//! 1. Disqualifiers: too many product links outside related panels, a
//!    product grid with pagination, or a generic listing heading without a
//!    `SKU:` marker
//! 2. Strong indicators: any one makes the page a product
//! 3. Weak indicators: enough of them make the page a product

use crate::config::ClassifierConfig;
use crate::crawler::links::product_link_count;
use crate::html::{exists, is_hidden, meta_content, primary_heading, selector};
use regex::Regex;
use scraper::Html;
use std::fmt;
use std::sync::LazyLock;

/// Headings that title listing pages
const LISTING_TITLES: &[&str] = &[
    "shop",
    "featured products",
    "all products",
    "products",
    "catalog",
    "catalogue",
    "store",
    "new arrivals",
    "best sellers",
    "sale",
    "search results",
    "categories",
    "brands",
];

const GRID_SELECTORS: &[&str] = &[
    "ul.products",
    ".products-grid",
    ".product-grid",
    ".product-list",
    ".product-listing",
    ".collection-grid",
];

const PAGINATION_SELECTORS: &[&str] = &[
    ".pagination",
    ".woocommerce-pagination",
    "nav.pagination",
    ".page-numbers",
    "a[rel='next']",
    "link[rel='next']",
];

const DETAIL_CONTAINERS: &[&str] = &[
    ".product-detail",
    ".product-details",
    "#product-detail",
    ".product-single",
    "div.product.type-product",
    "[itemtype*='schema.org/Product']",
];

const PRICE_SELECTORS: &[&str] = &[
    ".price",
    ".product-price",
    "[itemprop='price']",
    "[data-price]",
    ".woocommerce-Price-amount",
];

const CART_SELECTORS: &[&str] = &[
    "button[name='add-to-cart']",
    ".add-to-cart",
    ".single_add_to_cart_button",
    "#add-to-cart",
    "form.cart",
    "button.add_to_cart_button",
    "[data-action='add-to-cart']",
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    ".product-description",
    "#product-description",
    ".woocommerce-product-details__short-description",
    "#tab-description",
    "[itemprop='description']",
];

const QUANTITY_SELECTORS: &[&str] = &[
    "input[name='quantity']",
    "input.qty",
    "input[type='number'][name*='qty']",
];

static SKU_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bSKU\s*:").expect("valid SKU regex"));

static FORMATTED_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[$£€]\s?\d{1,3}(?:,\d{3})*(?:\.\d{2})?|\d+\.\d{2}\s?(?:USD|EUR|GBP))")
        .expect("valid price regex")
});

/// Why a page was, or was not, judged to be a product
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassificationReason {
    /// More product links than a single product page carries
    TooManyProductLinks(usize),
    /// Product grid together with pagination controls
    GridWithPagination,
    /// Generic listing heading such as "Shop"
    ListingTitle(String),
    /// A single strong indicator matched
    Strong(&'static str),
    /// Enough weak indicators matched
    WeakIndicators(usize),
    /// Nothing conclusive; too few weak indicators
    Insufficient(usize),
}

impl fmt::Display for ClassificationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooManyProductLinks(n) => write!(f, "{} product links", n),
            Self::GridWithPagination => write!(f, "product grid with pagination"),
            Self::ListingTitle(title) => write!(f, "listing heading \"{}\"", title),
            Self::Strong(indicator) => write!(f, "strong indicator: {}", indicator),
            Self::WeakIndicators(n) => write!(f, "{} weak indicators", n),
            Self::Insufficient(n) => write!(f, "only {} weak indicators", n),
        }
    }
}

/// Classifier verdict for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub is_product: bool,
    pub reason: ClassificationReason,
}

impl Classification {
    fn product(reason: ClassificationReason) -> Self {
        Self {
            is_product: true,
            reason,
        }
    }

    fn listing(reason: ClassificationReason) -> Self {
        Self {
            is_product: false,
            reason,
        }
    }
}

/// Returns true when the page shows a single product
pub fn is_product_page(document: &Html, config: &ClassifierConfig) -> bool {
    classify(document, config).is_product
}

/// Classifies a page, reporting the deciding reason
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `config` - Link ceiling and weak-indicator threshold
///
/// # Returns
///
/// A Classification; this function never fails
pub fn classify(document: &Html, config: &ClassifierConfig) -> Classification {
    let heading = primary_heading(document).unwrap_or_default();
    let has_sku_marker = SKU_MARKER.is_match(&heading);

    // Disqualifiers
    let links = product_link_count(document);
    if links > config.max_product_links {
        return Classification::listing(ClassificationReason::TooManyProductLinks(links));
    }

    if any_exists(document, GRID_SELECTORS) && any_exists(document, PAGINATION_SELECTORS) {
        return Classification::listing(ClassificationReason::GridWithPagination);
    }

    if !has_sku_marker {
        if let Some(title) = listing_title(&heading) {
            return Classification::listing(ClassificationReason::ListingTitle(title.to_string()));
        }
    }

    // Strong indicators
    if let Some(indicator) = strong_indicator(document, has_sku_marker) {
        return Classification::product(ClassificationReason::Strong(indicator));
    }

    // Weak indicators
    let weak = weak_indicator_count(document);
    if weak >= config.weak_indicator_threshold {
        Classification::product(ClassificationReason::WeakIndicators(weak))
    } else {
        Classification::listing(ClassificationReason::Insufficient(weak))
    }
}

/// Returns the listing title the heading equals or starts with
fn listing_title(heading: &str) -> Option<&'static str> {
    let lower = heading.trim().to_lowercase();
    LISTING_TITLES.iter().copied().find(|title| {
        lower == *title
            || lower
                .strip_prefix(title)
                .is_some_and(|rest| rest.starts_with(' '))
    })
}

fn strong_indicator(document: &Html, has_sku_marker: bool) -> Option<&'static str> {
    if has_sku_marker {
        return Some("SKU heading");
    }
    if any_exists(document, DETAIL_CONTAINERS) {
        return Some("product detail container");
    }
    if meta_content(document, "og:type").is_some_and(|t| t.eq_ignore_ascii_case("product")) {
        return Some("og:type product");
    }
    if has_json_ld_product(document) {
        return Some("JSON-LD Product");
    }
    None
}

fn weak_indicator_count(document: &Html) -> usize {
    let visible_price = selector(&PRICE_SELECTORS.join(", "))
        .is_some_and(|sel| document.select(&sel).any(|el| !is_hidden(el)));
    let body_text = selector("body")
        .and_then(|sel| document.select(&sel).next())
        .map(|body| body.text().collect::<String>())
        .unwrap_or_default();

    [
        visible_price,
        any_exists(document, CART_SELECTORS),
        any_exists(document, DESCRIPTION_SELECTORS),
        FORMATTED_PRICE.is_match(&body_text),
        any_exists(document, QUANTITY_SELECTORS),
    ]
    .iter()
    .filter(|hit| **hit)
    .count()
}

fn has_json_ld_product(document: &Html) -> bool {
    crate::extract::structured::json_ld_product(document).is_some()
}

fn any_exists(document: &Html, selectors: &[&str]) -> bool {
    selectors.iter().any(|css| exists(document, css))
}
