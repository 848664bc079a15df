//! Brand and category

use super::structured::named_field;
use super::{ProductPage, Strategy};
use crate::html::{element_text, first_text, selector};
use crate::product::GENERIC_TITLES;
use crate::url::{humanize_segment, path_segments};

const BRAND_SELECTORS: &[&str] = &[
    "[itemprop='brand'] [itemprop='name']",
    "[itemprop='brand']",
    ".product-brand",
    ".brand-name",
    ".product_meta .brand a",
    ".posted_in a[href*='/brand/']",
];

const CATEGORY_SELECTORS: &[&str] = &[
    ".product_meta .posted_in a",
    ".posted_in a",
    ".product-category",
    "[itemprop='category']",
];

const BREADCRUMB_SELECTORS: &[&str] = &[
    ".woocommerce-breadcrumb a",
    ".breadcrumb a",
    ".breadcrumbs a",
    "nav[aria-label='breadcrumb'] a",
    "[itemtype*='BreadcrumbList'] [itemprop='name']",
];

/// URL segments that never name a category
const NON_CATEGORY_SEGMENTS: &[&str] = &[
    "product",
    "products",
    "shop",
    "p",
    "item",
    "category",
    "categories",
    "product-category",
    "collections",
];

/// Brand strategies, in priority order
pub const BRAND_STRATEGIES: &[Strategy<String>] =
    &[brand_from_element, brand_from_structured, brand_from_known_list];

/// Category strategies, in priority order
pub const CATEGORY_STRATEGIES: &[Strategy<String>] = &[
    category_from_element,
    category_from_structured,
    category_from_breadcrumbs,
    category_from_url,
];

/// Returns the longest known brand contained in `name`, case-insensitively
///
/// ```
/// use shelf_sweep::extract::taxonomy::longest_known_brand;
///
/// let brands = vec!["Gaia".to_string(), "Gaia Herbs".to_string()];
/// assert_eq!(
///     longest_known_brand("Gaia Herbs Turmeric Supreme", &brands),
///     Some("Gaia Herbs".to_string())
/// );
/// ```
pub fn longest_known_brand(name: &str, known_brands: &[String]) -> Option<String> {
    let lower = name.to_lowercase();
    known_brands
        .iter()
        .filter(|brand| !brand.trim().is_empty() && lower.contains(&brand.to_lowercase()))
        .max_by_key(|brand| brand.chars().count())
        .cloned()
}

fn is_generic(label: &str) -> bool {
    let lower = label.trim().to_lowercase();
    GENERIC_TITLES.contains(&lower.as_str())
}

fn brand_from_element(page: &ProductPage<'_>) -> Option<String> {
    first_text(page.document, BRAND_SELECTORS)
        .map(|text| {
            text.trim_start_matches("Brand:")
                .trim_start_matches("brand:")
                .trim()
                .to_string()
        })
        .filter(|text| !text.is_empty())
}

fn brand_from_structured(page: &ProductPage<'_>) -> Option<String> {
    let product = page.structured.as_ref()?;
    named_field(product, "brand").or_else(|| named_field(product, "manufacturer"))
}

fn brand_from_known_list(page: &ProductPage<'_>) -> Option<String> {
    longest_known_brand(&page.name, page.known_brands)
}

fn category_from_element(page: &ProductPage<'_>) -> Option<String> {
    first_text(page.document, CATEGORY_SELECTORS).filter(|text| !is_generic(text))
}

fn category_from_structured(page: &ProductPage<'_>) -> Option<String> {
    let raw = named_field(page.structured.as_ref()?, "category")?;
    // "Teas > Herbal Teas" style paths name the most specific category last
    raw.rsplit(['>', '/'])
        .map(str::trim)
        .find(|part| !part.is_empty())
        .map(str::to_string)
        .filter(|text| !is_generic(text))
}

fn category_from_breadcrumbs(page: &ProductPage<'_>) -> Option<String> {
    BREADCRUMB_SELECTORS.iter().find_map(|css| {
        let sel = selector(css)?;
        let crumbs: Vec<String> = page.document.select(&sel).map(element_text).collect();
        crumbs
            .into_iter()
            .rev()
            .find(|crumb| !crumb.is_empty() && !is_generic(crumb) && *crumb != page.name)
    })
}

fn category_from_url(page: &ProductPage<'_>) -> Option<String> {
    let mut segments = path_segments(page.url);
    // The last segment is the product slug
    segments.pop()?;

    segments
        .iter()
        .rev()
        .find(|s| {
            let lower = s.to_ascii_lowercase();
            !NON_CATEGORY_SEGMENTS.contains(&lower.as_str())
                && !lower.chars().all(|c| c.is_ascii_digit())
        })
        .map(|s| humanize_segment(s))
        .filter(|label| !label.is_empty())
}
