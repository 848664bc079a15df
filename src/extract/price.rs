//! Price and compare-at price
//!
//! Each strategy only returns a price inside the accepted range; an
//! implausible value (a phone number, a total, a year) lets the next
//! strategy run.

use super::structured::{offers, text_field};
use super::{ProductPage, Strategy};
use crate::html::{meta_content, selector};
use crate::product::is_plausible_price;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;

static CURRENCY_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[$£€]\s?(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)")
        .expect("valid currency regex")
});

static PLAIN_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?").expect("valid amount regex")
});

/// Elements wrapping the main product, most specific first
pub(crate) const PRODUCT_CONTAINERS: &[&str] = &[
    ".product-detail",
    ".product-details",
    "#product-detail",
    ".product-single",
    "div.product.type-product",
    ".summary.entry-summary",
    "[itemtype*='schema.org/Product']",
];

/// Elements that bound the product around its heading when no known
/// container exists
const HEADING_SCOPES: &[&str] = &["article", "section", "form"];

const PRICE_SELECTORS: &[&str] = &[
    ".price ins .amount",
    ".price ins",
    "[itemprop='price']",
    ".product-price",
    ".current-price",
    ".sale-price",
    ".price .amount",
    ".price",
];

const COMPARE_SELECTORS: &[&str] = &[
    ".price del",
    "del .amount",
    ".compare-price",
    ".compare-at-price",
    ".was-price",
    ".regular-price",
    "s.price",
];

/// Price strategies, in priority order
pub const PRICE_STRATEGIES: &[Strategy<f64>] = &[
    price_from_structured,
    price_from_meta,
    price_from_data_attribute,
    price_from_selectors,
    price_from_container_text,
];

/// Parses the first amount in a piece of text
///
/// A currency-marked amount is preferred over a bare number. Thousands
/// separators are removed.
///
/// ```
/// use shelf_sweep::extract::price::parse_amount;
///
/// assert_eq!(parse_amount("Now only $19.99 each"), Some(19.99));
/// assert_eq!(parse_amount("$12,345.00"), Some(12345.0));
/// assert_eq!(parse_amount("no price"), None);
/// ```
pub fn parse_amount(text: &str) -> Option<f64> {
    let raw = CURRENCY_AMOUNT
        .captures(text)
        .and_then(|c| c.get(1))
        .or_else(|| PLAIN_AMOUNT.find(text))?;
    raw.as_str().replace(',', "").parse().ok()
}

/// Returns the struck-through regular price when it exceeds `price`
pub fn compare_price(page: &ProductPage<'_>, price: f64) -> Option<f64> {
    if price <= 0.0 {
        return None;
    }
    let container = product_container(page.document)?;

    COMPARE_SELECTORS
        .iter()
        .filter_map(|css| selector(css))
        .flat_map(|sel| {
            container
                .select(&sel)
                .filter_map(|el| parse_amount(&el.text().collect::<String>()))
                .collect::<Vec<_>>()
        })
        .find(|compare| *compare > price && is_plausible_price(*compare))
}

/// Returns the innermost known product container
///
/// Without one, the nearest article, section or form around the first `h1`
/// stands in. A bare page has no container, so banner and navigation prices
/// are never read.
pub(crate) fn product_container(document: &Html) -> Option<ElementRef<'_>> {
    PRODUCT_CONTAINERS
        .iter()
        .find_map(|css| {
            let sel = selector(css)?;
            document.select(&sel).next()
        })
        .or_else(|| heading_scope(document))
}

fn heading_scope(document: &Html) -> Option<ElementRef<'_>> {
    let sel = selector("h1")?;
    let heading = document.select(&sel).next()?;
    heading
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| HEADING_SCOPES.contains(&el.value().name()))
}

fn plausible(price: f64) -> Option<f64> {
    is_plausible_price(price).then_some(price)
}

fn price_from_structured(page: &ProductPage<'_>) -> Option<f64> {
    let product = page.structured.as_ref()?;
    offers(product).into_iter().find_map(|offer| {
        ["price", "lowPrice"]
            .iter()
            .filter_map(|key| text_field(offer, key))
            .find_map(|raw| parse_amount(&raw).and_then(plausible))
    })
}

fn price_from_meta(page: &ProductPage<'_>) -> Option<f64> {
    ["product:price:amount", "og:price:amount", "price"]
        .iter()
        .filter_map(|key| meta_content(page.document, key))
        .find_map(|raw| parse_amount(&raw).and_then(plausible))
}

fn price_from_data_attribute(page: &ProductPage<'_>) -> Option<f64> {
    let container = product_container(page.document)?;
    let sel = selector("[data-price], [data-product-price]")?;
    container.select(&sel).find_map(|el| {
        el.value()
            .attr("data-price")
            .or_else(|| el.value().attr("data-product-price"))
            .and_then(parse_amount)
            .and_then(plausible)
    })
}

fn price_from_selectors(page: &ProductPage<'_>) -> Option<f64> {
    let container = product_container(page.document)?;
    PRICE_SELECTORS.iter().find_map(|css| {
        let sel = selector(css)?;
        container.select(&sel).find_map(|el| {
            let content = el.value().attr("content").map(str::to_string);
            let text = content.unwrap_or_else(|| unstruck_text(el));
            parse_amount(&text).and_then(plausible)
        })
    })
}

fn price_from_container_text(page: &ProductPage<'_>) -> Option<f64> {
    let container = product_container(page.document)?;
    let text = unstruck_text(container);
    CURRENCY_AMOUNT
        .captures_iter(&text)
        .filter_map(|c| c.get(1))
        .filter_map(|m| m.as_str().replace(',', "").parse::<f64>().ok())
        .find_map(plausible)
}

/// Text of an element, leaving out struck-through (`del`, `s`) parts
fn unstruck_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    for node in element.descendants() {
        let Some(fragment) = node.value().as_text() else {
            continue;
        };
        let struck = node
            .ancestors()
            .take_while(|a| a.id() != element.id())
            .filter_map(ElementRef::wrap)
            .any(|a| matches!(a.value().name(), "del" | "s" | "strike"));
        if !struck {
            text.push_str(fragment);
            text.push(' ');
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::super::first_of;
    use super::*;
    use url::Url;

    fn price_of(body: &str) -> Option<f64> {
        let doc = Html::parse_document(&format!("<html><body>{}</body></html>", body));
        let url = Url::parse("https://s.com/product/tea/").unwrap();
        let page = ProductPage::new(&doc, &url, &[]);
        first_of(&page, PRICE_STRATEGIES)
    }

    #[test]
    fn test_price_in_container_text() {
        let body = r#"<div class="product-detail"><h1>Tea</h1><p>Now only $19.99 each</p></div>"#;
        assert_eq!(price_of(body), Some(19.99));
    }

    #[test]
    fn test_banner_price_outside_container_ignored() {
        let body = r#"<nav>Free shipping on orders over $50.00</nav>
            <h1>Lavender Calm Tea</h1><p>Now only $19.99 each</p>"#;
        assert_eq!(price_of(body), None);
    }

    #[test]
    fn test_heading_section_bounds_price() {
        let body = r#"<nav>Free shipping on orders over $50.00</nav>
            <article><h1>Lavender Calm Tea</h1><p>Now only $19.99 each</p></article>"#;
        assert_eq!(price_of(body), Some(19.99));
    }

    #[test]
    fn test_out_of_range_price_rejected() {
        let body = r#"<div class="product-detail"><span class="price">$12,345.00</span></div>"#;
        assert_eq!(price_of(body), None);
    }

    #[test]
    fn test_out_of_range_falls_through_to_next_strategy() {
        let body = r#"<div class="product-detail" data-price="99999">
            <span class="price">$24.00</span></div>"#;
        assert_eq!(price_of(body), Some(24.0));
    }

    #[test]
    fn test_structured_offer_price_wins() {
        let body = r#"<script type="application/ld+json">
            {"@type":"Product","offers":{"@type":"Offer","price":"15.50"}}</script>
            <span class="price">$99.00</span>"#;
        assert_eq!(price_of(body), Some(15.5));
    }

    #[test]
    fn test_sale_price_ignores_struck_regular_price() {
        let body = r#"<div class="product-detail"><p class="price"><del>$30.00</del> $22.00</p></div>"#;
        assert_eq!(price_of(body), Some(22.0));
    }

    #[test]
    fn test_compare_price_must_exceed_price() {
        let doc = Html::parse_document(
            r#"<div class="product-detail"><p class="price"><del>$30.00</del> <ins>$22.00</ins></p></div>"#,
        );
        let url = Url::parse("https://s.com/product/tea/").unwrap();
        let page = ProductPage::new(&doc, &url, &[]);

        assert_eq!(compare_price(&page, 22.0), Some(30.0));
        assert_eq!(compare_price(&page, 35.0), None);
        assert_eq!(compare_price(&page, 0.0), None);
    }
}
