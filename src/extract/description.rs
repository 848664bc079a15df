//! Long and short product descriptions

use super::price::product_container;
use super::structured::text_field;
use super::{ProductPage, Strategy};
use crate::html::{collapse_whitespace, element_text, first_text, meta_content, selector};
use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

/// Longest description kept
pub const MAX_DESCRIPTION_CHARS: usize = 5000;

/// Longest short description
pub const MAX_SHORT_DESCRIPTION_CHARS: usize = 200;

/// Structured descriptions shorter than this are usually a tagline
const MIN_STRUCTURED_CHARS: usize = 50;

const DESCRIPTION_BLOCKS: &[&str] = &[
    ".product-description",
    "#product-description",
    "#tab-description",
    ".woocommerce-Tabs-panel--description",
    ".product-details__description",
    "[itemprop='description']",
    ".description",
];

const SHORT_DESCRIPTION_SELECTORS: &[&str] = &[
    ".woocommerce-product-details__short-description",
    ".short-description",
    ".product-short-description",
    ".product-summary",
];

/// Lines that belong to the page chrome rather than the description
const BOILERPLATE: &[&str] = &[
    "add to cart",
    "add to basket",
    "buy now",
    "quantity",
    "qty",
    "sku:",
    "category:",
    "categories:",
    "tags:",
    "share",
    "reviews",
    "in stock",
    "out of stock",
    "free shipping",
    "wishlist",
];

static PRICE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[$£€]\s?\d").expect("valid price line regex"));

/// Description strategies, in priority order
pub const DESCRIPTION_STRATEGIES: &[Strategy<String>] = &[
    from_structured,
    from_meta,
    from_description_heading,
    from_known_block,
    from_text_after_price,
];

/// Truncates a description to [`MAX_DESCRIPTION_CHARS`] characters
pub fn cap_description(text: &str) -> String {
    let collapsed = collapse_whitespace(text);
    if collapsed.chars().count() <= MAX_DESCRIPTION_CHARS {
        collapsed
    } else {
        collapsed.chars().take(MAX_DESCRIPTION_CHARS).collect()
    }
}

/// Resolves the short description
///
/// A dedicated element wins; otherwise the first sentence of `description`
/// when it is short enough, else its first 200 characters cut on a word
/// boundary.
pub fn short_description(page: &ProductPage<'_>, description: &str) -> String {
    if let Some(text) = first_text(page.document, SHORT_DESCRIPTION_SELECTORS) {
        return truncate_words(&text, MAX_SHORT_DESCRIPTION_CHARS);
    }
    derive_short_description(description)
}

/// Derives a short description from a long one
///
/// ```
/// use shelf_sweep::extract::description::derive_short_description;
///
/// assert_eq!(
///     derive_short_description("Soothing tea. Best served warm."),
///     "Soothing tea."
/// );
/// ```
pub fn derive_short_description(description: &str) -> String {
    let text = collapse_whitespace(description);
    if text.is_empty() {
        return text;
    }

    if let Some(sentence) = first_sentence(&text) {
        if sentence.chars().count() <= MAX_SHORT_DESCRIPTION_CHARS {
            return sentence.to_string();
        }
    }
    truncate_words(&text, MAX_SHORT_DESCRIPTION_CHARS)
}

fn first_sentence(text: &str) -> Option<&str> {
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let next = chars.peek().map(|(_, n)| *n);
            if next.map_or(true, char::is_whitespace) {
                return Some(&text[..i + c.len_utf8()]);
            }
        }
    }
    None
}

/// Cuts text to at most `max` characters, backing off to the last space
fn truncate_words(text: &str, max: usize) -> String {
    let text = collapse_whitespace(text);
    if text.chars().count() <= max {
        return text;
    }

    let cut: String = text.chars().take(max).collect();
    match cut.rfind(' ') {
        Some(space) if space > 0 => cut[..space].trim_end().to_string(),
        _ => cut,
    }
}

fn long_enough(text: String, min: usize) -> Option<String> {
    let text = collapse_whitespace(&text);
    (text.chars().count() >= min).then_some(text)
}

fn from_structured(page: &ProductPage<'_>) -> Option<String> {
    let text = text_field(page.structured.as_ref()?, "description")?;
    long_enough(text, MIN_STRUCTURED_CHARS)
}

fn from_meta(page: &ProductPage<'_>) -> Option<String> {
    meta_content(page.document, "og:description")
        .or_else(|| meta_content(page.document, "description"))
        .and_then(|text| long_enough(text, 1))
}

/// Paragraphs following a "Product Description" heading, up to the next heading
fn from_description_heading(page: &ProductPage<'_>) -> Option<String> {
    let headings = selector("h2, h3, h4, h5, strong")?;
    let heading = page.document.select(&headings).find(|el| {
        element_text(*el)
            .to_lowercase()
            .starts_with("product description")
    })?;

    let mut parts: Vec<String> = Vec::new();
    let mut length = 0;
    for sibling in heading.next_siblings().filter_map(ElementRef::wrap) {
        if is_heading(sibling) {
            break;
        }
        let text = element_text(sibling);
        if text.is_empty() {
            continue;
        }
        length += text.chars().count();
        parts.push(text);
        if length >= MAX_DESCRIPTION_CHARS {
            break;
        }
    }

    long_enough(parts.join(" "), 1)
}

fn from_known_block(page: &ProductPage<'_>) -> Option<String> {
    first_text(page.document, DESCRIPTION_BLOCKS)
}

/// Text lines following the first price, skipping page chrome
fn from_text_after_price(page: &ProductPage<'_>) -> Option<String> {
    let container = product_container(page.document)?;
    let lines: Vec<String> = container
        .text()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect();

    let start = lines.iter().position(|line| PRICE_LINE.is_match(line))?;
    let kept: Vec<&str> = lines[start + 1..]
        .iter()
        .filter(|line| line.chars().count() >= 20 && !is_boilerplate(line))
        .map(String::as_str)
        .collect();

    long_enough(kept.join(" "), MIN_STRUCTURED_CHARS)
}

fn is_boilerplate(line: &str) -> bool {
    let lower = line.to_lowercase();
    BOILERPLATE.iter().any(|b| lower.starts_with(b)) || PRICE_LINE.is_match(line)
}

fn is_heading(element: ElementRef<'_>) -> bool {
    matches!(element.value().name(), "h1" | "h2" | "h3" | "h4" | "h5" | "h6")
}

#[cfg(test)]
mod tests {
    use super::super::first_of;
    use super::*;
    use scraper::Html;
    use url::Url;

    fn description_of(html: &str) -> Option<String> {
        let doc = Html::parse_document(html);
        let url = Url::parse("https://s.com/product/tea/").unwrap();
        let page = ProductPage::new(&doc, &url, &[]);
        first_of(&page, DESCRIPTION_STRATEGIES)
    }

    #[test]
    fn test_short_structured_description_skipped() {
        let html = r#"<script type="application/ld+json">{"@type":"Product","description":"Tea."}</script>
            <div class="product-description">A long and careful description of a herbal tea blend.</div>"#;
        assert_eq!(
            description_of(html),
            Some("A long and careful description of a herbal tea blend.".to_string())
        );
    }

    #[test]
    fn test_description_after_heading_stops_at_next_heading() {
        let html = r#"<div>
            <h3>Product Description</h3>
            <p>First paragraph.</p>
            <p>Second   paragraph.</p>
            <h3>Reviews</h3>
            <p>Great tea!</p>
        </div>"#;
        assert_eq!(
            description_of(html),
            Some("First paragraph. Second paragraph.".to_string())
        );
    }

    #[test]
    fn test_text_after_price_skips_boilerplate() {
        let html = r#"<div class="product-detail">
            <h1>Tea</h1>
            <p>$9.99</p>
            <p>Add to cart</p>
            <p>A gentle evening blend of chamomile, lemon balm and lavender flowers.</p>
            <p>SKU: 100 Category: Teas and more</p>
        </div>"#;
        assert_eq!(
            description_of(html),
            Some("A gentle evening blend of chamomile, lemon balm and lavender flowers.".to_string())
        );
    }

    #[test]
    fn test_cap_description() {
        let long = "word ".repeat(2000);
        assert_eq!(cap_description(&long).chars().count(), MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn test_short_description_long_sentence_cut_on_word() {
        let sentence = format!("{} end.", "steeped ".repeat(40));
        let short = derive_short_description(&sentence);
        assert!(short.chars().count() <= MAX_SHORT_DESCRIPTION_CHARS);
        assert!(short.ends_with("steeped"));
    }

    #[test]
    fn test_short_description_decimal_not_sentence_end() {
        assert_eq!(
            derive_short_description("Contains 2.5 g per bag. Brew hot."),
            "Contains 2.5 g per bag."
        );
    }

    #[test]
    fn test_short_description_dedicated_element() {
        let doc = Html::parse_document(
            r#"<div class="short-description"> Calming   blend </div>"#,
        );
        let url = Url::parse("https://s.com/product/tea/").unwrap();
        let page = ProductPage::new(&doc, &url, &[]);
        assert_eq!(short_description(&page, "Ignored. Text."), "Calming blend");
    }
}
