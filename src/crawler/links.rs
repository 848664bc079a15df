//! Link extraction for listing pages
//!
//! This module pulls two kinds of links out of a parsed page:
//! - Product links (anchors whose path contains a product segment, or anchors
//!   inside product-card elements)
//! - Category and brand links (anchors whose path contains a category or
//!   brand segment)
//!
//! Every link is resolved against the page URL, restricted to the page's
//! site, normalized, and deduplicated in first-seen order.

use crate::html::{has_ancestor_class, selector};
use crate::url::{humanize_segment, normalize_url, path_segments, resolve_link, same_site};
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use url::Url;

/// Path segments that introduce a single product
const PRODUCT_SEGMENTS: &[&str] = &["product", "products"];

/// Path segments that introduce a category listing
const CATEGORY_SEGMENTS: &[&str] = &[
    "category",
    "categories",
    "product-category",
    "collections",
    "department",
];

/// Path segments that introduce a brand listing
const BRAND_SEGMENTS: &[&str] = &["brand", "brands", "product-brand", "manufacturer"];

/// Anchors inside these elements point at products whatever their path
const PRODUCT_CARD_SELECTORS: &[&str] = &[
    ".product-card a[href]",
    ".product-item a[href]",
    "li.product a[href]",
    "a.woocommerce-LoopProduct-link[href]",
    ".product-grid .product a[href]",
];

/// Containers whose product links belong to other products
const RELATED_CONTAINERS: &[&str] = &[
    "related",
    "upsells",
    "related-products",
    "cross-sells",
    "recently-viewed",
];

/// Links found on one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// Normalized product page URLs
    pub product_links: Vec<String>,
    /// Normalized category and brand listing URLs
    pub category_links: Vec<String>,
}

/// What a listing page groups its products by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Category,
    Brand,
}

/// Extracts product and listing links from a page
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `page_url` - The URL the page was fetched from, used for resolution and
///   the same-site check
///
/// # Example
///
/// ```
/// use scraper::Html;
/// use shelf_sweep::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/product/green-tea/">Tea</a><a href="/category/teas/">Teas</a>"#;
/// let page = Url::parse("https://shop.example.com/").unwrap();
/// let links = extract_links(&Html::parse_document(html), &page);
/// assert_eq!(links.product_links, vec!["https://shop.example.com/product/green-tea/"]);
/// assert_eq!(links.category_links, vec!["https://shop.example.com/category/teas/"]);
/// ```
pub fn extract_links(document: &Html, page_url: &Url) -> PageLinks {
    let mut links = PageLinks::default();
    let mut seen_products = HashSet::new();
    let mut seen_categories = HashSet::new();

    let resolve = |href: &str| resolve_same_site(href, page_url);

    for (_, url) in product_anchors(document, resolve) {
        push_unique(&mut links.product_links, &mut seen_products, url);
    }

    if let Some(anchors) = selector("a[href]") {
        for element in document.select(&anchors) {
            let Some(url) = element.value().attr("href").and_then(resolve) else {
                continue;
            };
            if !is_product_url(&url) && listing_kind(&url).is_some() {
                push_unique(&mut links.category_links, &mut seen_categories, url);
            }
        }
    }

    links
}

/// Counts the distinct product links on a page, ignoring links inside
/// related/upsell panels
///
/// Counts the same anchors [`extract_links`] reports as product links, both
/// product-path links and product-card anchors. Relative links are counted by
/// path alone, so no page URL is needed.
pub fn product_link_count(document: &Html) -> usize {
    let Ok(placeholder) = Url::parse("http://page.invalid/") else {
        return 0;
    };

    let mut seen = HashSet::new();
    for (element, mut url) in product_anchors(document, |href| resolve_link(href, &placeholder)) {
        if has_ancestor_class(element, RELATED_CONTAINERS) {
            continue;
        }
        url.set_fragment(None);
        url.set_query(None);
        seen.insert(url.to_string());
    }
    seen.len()
}

/// Anchors that point at products, in document order
///
/// Product-path links come first, then anchors inside product cards. The same
/// URL may appear more than once.
fn product_anchors<'a, F>(document: &'a Html, resolve: F) -> Vec<(ElementRef<'a>, Url)>
where
    F: Fn(&str) -> Option<Url>,
{
    let mut found = Vec::new();

    if let Some(anchors) = selector("a[href]") {
        for element in document.select(&anchors) {
            let Some(url) = element.value().attr("href").and_then(&resolve) else {
                continue;
            };
            if is_product_url(&url) {
                found.push((element, url));
            }
        }
    }

    for css in PRODUCT_CARD_SELECTORS {
        let Some(sel) = selector(css) else {
            continue;
        };
        for element in document.select(&sel) {
            let Some(url) = element.value().attr("href").and_then(&resolve) else {
                continue;
            };
            if is_card_product_link(&url) {
                found.push((element, url));
            }
        }
    }

    found
}

/// A product-card anchor names a product unless it is a listing, the site
/// root or a cart action
fn is_card_product_link(url: &Url) -> bool {
    listing_kind(url).is_none() && !path_segments(url).is_empty() && !is_cart_link(url)
}

/// Returns true when the URL's path names a single product
///
/// A product segment must be followed by another segment: `/product/tea/`
/// is a product, `/products/` is a listing.
pub fn is_product_url(url: &Url) -> bool {
    if is_cart_link(url) {
        return false;
    }
    let segments = path_segments(url);
    let Some(product_at) = segments.iter().rposition(|s| has_segment(PRODUCT_SEGMENTS, s)) else {
        return false;
    };
    if product_at + 1 >= segments.len() {
        return false;
    }

    // Storefronts nest products under listings, e.g. /collections/teas/products/green-tea
    match listing_position(&segments) {
        Some(listing_at) => product_at > listing_at,
        None => true,
    }
}

/// Tells whether a URL is a category or brand listing
pub fn listing_kind(url: &Url) -> Option<ListingKind> {
    let segments = path_segments(url);
    let at = listing_position(&segments)?;
    if has_segment(BRAND_SEGMENTS, &segments[at]) {
        Some(ListingKind::Brand)
    } else {
        Some(ListingKind::Category)
    }
}

/// Display label of a listing page, taken from its last path segment
///
/// ```
/// use shelf_sweep::crawler::listing_label;
/// use url::Url;
///
/// let url = Url::parse("https://shop.example.com/brand/gaia-herbs/?page=2").unwrap();
/// assert_eq!(listing_label(&url), Some("Gaia Herbs".to_string()));
/// ```
pub fn listing_label(url: &Url) -> Option<String> {
    let segments = path_segments(url);
    let last = segments.last()?;
    let label = humanize_segment(last);
    (!label.is_empty()).then_some(label)
}

/// Position of the first category or brand segment that has a slug after it
fn listing_position(segments: &[String]) -> Option<usize> {
    segments.iter().enumerate().position(|(i, s)| {
        i + 1 < segments.len()
            && (has_segment(CATEGORY_SEGMENTS, s) || has_segment(BRAND_SEGMENTS, s))
    })
}

fn has_segment(table: &[&str], segment: &str) -> bool {
    table.iter().any(|t| t.eq_ignore_ascii_case(segment))
}

fn is_cart_link(url: &Url) -> bool {
    url.query_pairs()
        .any(|(k, _)| k == "add-to-cart" || k == "add_to_cart")
}

fn resolve_same_site(href: &str, page_url: &Url) -> Option<Url> {
    let url = resolve_link(href, page_url)?;
    if !same_site(page_url, &url) {
        return None;
    }
    normalize_url(url.as_str()).ok()
}

fn push_unique(list: &mut Vec<String>, seen: &mut HashSet<String>, url: Url) {
    let key = url.to_string();
    if seen.insert(key.clone()) {
        list.push(key);
    }
}
