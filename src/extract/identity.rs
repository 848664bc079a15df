//! Product name and SKU
//!
//! Many storefronts print the SKU in the heading itself
//! (`"Valid Herb Tea SKU: 100"`), so the heading is split first.

use super::structured::text_field;
use super::{first_of, ProductPage, Strategy};
use crate::html::{first_text, meta_content, selector};
use crate::url::last_path_segment;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

static HEADING_SKU: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?P<name>.*?)[\s\-–|,(]*\bSKU\s*[:#]\s*(?P<sku>[A-Za-z0-9][A-Za-z0-9\-_./]*)")
        .expect("valid heading regex")
});

static SKU_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:SKU|item\s*(?:no|#)|product\s*code)\s*[:#.]?\s*")
        .expect("valid label regex")
});

const TITLE_SELECTORS: &[&str] = &[
    "h1.product_title",
    ".product_title",
    ".product-title",
    ".product-name",
    "[itemprop='name']",
    "h1",
];

const SKU_SELECTORS: &[&str] = &[
    "[itemprop='sku']",
    ".sku",
    ".product-sku",
    ".product_meta .sku",
    "[data-sku]",
];

/// Name strategies, in priority order
pub const NAME_STRATEGIES: &[Strategy<String>] = &[
    name_from_heading,
    name_from_title_element,
    name_from_structured,
    name_from_og_title,
    name_from_document_title,
];

const SKU_STRATEGIES: &[Strategy<String>] = &[
    sku_from_heading,
    sku_from_element,
    sku_from_structured,
    sku_from_meta,
];

/// Splits a `"<name> SKU: <code>"` heading
///
/// ```
/// use shelf_sweep::extract::identity::split_heading;
///
/// assert_eq!(
///     split_heading("Valid Herb Tea SKU: 100"),
///     Some(("Valid Herb Tea".to_string(), "100".to_string()))
/// );
/// assert_eq!(split_heading("Valid Herb Tea"), None);
/// ```
pub fn split_heading(heading: &str) -> Option<(String, String)> {
    let captures = HEADING_SKU.captures(heading)?;
    let name = captures.name("name")?.as_str().trim().to_string();
    let sku = captures
        .name("sku")?
        .as_str()
        .trim_end_matches(['.', ')'])
        .to_string();
    Some((name, sku))
}

/// Resolves the SKU, synthesizing one from the URL when the page has none
pub fn extract_sku(page: &ProductPage<'_>) -> String {
    first_of(page, SKU_STRATEGIES).unwrap_or_else(|| synthesize_sku(page.url.as_str()))
}

/// Derives a stable SKU from a product URL
///
/// The last path segment is upper-cased with non-alphanumerics mapped to
/// dashes. A URL without a usable segment gets `SKU-` plus the first ten hex
/// digits of its SHA-256.
pub fn synthesize_sku(url: &str) -> String {
    let slug = ::url::Url::parse(url)
        .ok()
        .and_then(|u| last_path_segment(&u))
        .map(|segment| {
            let stem = segment
                .rsplit_once('.')
                .filter(|(_, ext)| matches!(*ext, "html" | "htm" | "php" | "aspx"))
                .map(|(stem, _)| stem.to_string())
                .unwrap_or(segment);
            stem.chars()
                .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '-' })
                .collect::<String>()
                .trim_matches('-')
                .to_string()
        })
        .unwrap_or_default();

    if !slug.is_empty() {
        return slug;
    }

    let digest = hex::encode(Sha256::digest(url.as_bytes()));
    format!("SKU-{}", digest[..10].to_uppercase())
}

fn non_empty(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn name_from_heading(page: &ProductPage<'_>) -> Option<String> {
    let (name, _) = split_heading(page.heading.as_deref()?)?;
    non_empty(name)
}

fn name_from_title_element(page: &ProductPage<'_>) -> Option<String> {
    let text = first_text(page.document, TITLE_SELECTORS)?;
    // A title element may itself carry the SKU suffix
    match split_heading(&text) {
        Some((name, _)) => non_empty(name),
        None => non_empty(text),
    }
}

fn name_from_structured(page: &ProductPage<'_>) -> Option<String> {
    text_field(page.structured.as_ref()?, "name")
}

fn name_from_og_title(page: &ProductPage<'_>) -> Option<String> {
    meta_content(page.document, "og:title").map(strip_site_suffix).and_then(non_empty)
}

fn name_from_document_title(page: &ProductPage<'_>) -> Option<String> {
    first_text(page.document, &["title"])
        .map(strip_site_suffix)
        .and_then(non_empty)
}

/// Drops a trailing `" | Site Name"` or `" - Site Name"`
fn strip_site_suffix(title: String) -> String {
    for separator in [" | ", " – ", " — ", " - "] {
        if let Some((head, _)) = title.rsplit_once(separator) {
            return head.trim().to_string();
        }
    }
    title
}

fn sku_from_heading(page: &ProductPage<'_>) -> Option<String> {
    let (_, sku) = split_heading(page.heading.as_deref()?)?;
    non_empty(sku)
}

fn sku_from_element(page: &ProductPage<'_>) -> Option<String> {
    SKU_SELECTORS.iter().find_map(|css| {
        let sel = selector(css)?;
        page.document.select(&sel).find_map(|el| {
            let raw = el
                .value()
                .attr("data-sku")
                .or_else(|| el.value().attr("content"))
                .map(str::to_string)
                .unwrap_or_else(|| el.text().collect::<String>());
            let cleaned = SKU_LABEL.replace(raw.trim(), "").trim().to_string();
            (!cleaned.is_empty() && !cleaned.eq_ignore_ascii_case("n/a")).then_some(cleaned)
        })
    })
}

fn sku_from_structured(page: &ProductPage<'_>) -> Option<String> {
    let product = page.structured.as_ref()?;
    text_field(product, "sku").or_else(|| text_field(product, "mpn"))
}

fn sku_from_meta(page: &ProductPage<'_>) -> Option<String> {
    meta_content(page.document, "product:retailer_item_id")
        .or_else(|| meta_content(page.document, "sku"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;
    use url::Url;

    fn with_page<R>(html: &str, url: &str, f: impl FnOnce(&ProductPage<'_>) -> R) -> R {
        let doc = Html::parse_document(html);
        let url = Url::parse(url).unwrap();
        let page = ProductPage::new(&doc, &url, &[]);
        f(&page)
    }

    #[test]
    fn test_split_heading_variants() {
        assert_eq!(
            split_heading("Sleep Tea - SKU: ST-20"),
            Some(("Sleep Tea".to_string(), "ST-20".to_string()))
        );
        assert_eq!(
            split_heading("Sleep Tea (sku# 77)"),
            Some(("Sleep Tea".to_string(), "77".to_string()))
        );
    }

    #[test]
    fn test_name_falls_back_to_title_selectors() {
        let name = with_page(
            r#"<h2 class="product-title">Lemon Balm Tea</h2>"#,
            "https://s.com/product/lemon-balm/",
            |page| first_of(page, NAME_STRATEGIES),
        );
        assert_eq!(name, Some("Lemon Balm Tea".to_string()));
    }

    #[test]
    fn test_name_from_document_title_strips_site() {
        let name = with_page(
            "<html><head><title>Lemon Balm Tea | Leafy Shop</title></head><body></body></html>",
            "https://s.com/product/lemon-balm/",
            |page| first_of(page, NAME_STRATEGIES),
        );
        assert_eq!(name, Some("Lemon Balm Tea".to_string()));
    }

    #[test]
    fn test_sku_from_labelled_element() {
        let sku = with_page(
            r#"<h1>Lemon Balm Tea</h1><span class="sku">SKU: LB-1</span>"#,
            "https://s.com/product/lemon-balm/",
            |page| extract_sku(page),
        );
        assert_eq!(sku, "LB-1");
    }

    #[test]
    fn test_sku_from_structured_mpn() {
        let sku = with_page(
            r#"<script type="application/ld+json">{"@type":"Product","mpn":"MP-9"}</script>"#,
            "https://s.com/product/lemon-balm/",
            |page| extract_sku(page),
        );
        assert_eq!(sku, "MP-9");
    }

    #[test]
    fn test_synthesized_sku() {
        assert_eq!(synthesize_sku("https://s.com/product/lemon-balm/"), "LEMON-BALM");
        assert_eq!(synthesize_sku("https://s.com/p/green_tea.html"), "GREEN-TEA");

        let hashed = synthesize_sku("https://s.com/");
        assert!(hashed.starts_with("SKU-"));
        assert_eq!(hashed.len(), 14);
        assert_eq!(hashed, synthesize_sku("https://s.com/"));
    }
}
