//! Stock level, weight and ingredients

use super::price::product_container;
use super::structured::{offers, text_field};
use super::{ProductPage, Strategy};
use crate::html::{collapse_whitespace, element_text, first_text, is_hidden, selector};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

const AVAILABILITY_SELECTORS: &[&str] = &[
    ".stock",
    ".availability",
    ".product-availability",
    ".inventory-status",
    "[itemprop='availability']",
];

const OUT_OF_STOCK_SELECTORS: &[&str] = &[
    ".out-of-stock",
    ".sold-out",
    ".soldout",
    "[data-availability='out-of-stock']",
];

const OUT_OF_STOCK_PHRASES: &[&str] = &["out of stock", "sold out", "currently unavailable"];

const ATTRIBUTE_ROWS: &[&str] = &[
    ".woocommerce-product-attributes tr",
    ".product-attributes tr",
    ".product-specs tr",
    ".additional-information tr",
];

const INGREDIENT_BLOCKS: &[&str] = &[
    ".ingredients",
    "#ingredients",
    "#tab-ingredients",
    ".product-ingredients",
    "[data-tab='ingredients']",
];

/// Longest ingredients text kept
const MAX_INGREDIENTS_CHARS: usize = 1000;

static STOCK_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:(\d+)\s+(?:in stock|available|left)|only\s+(\d+)\s+left)")
        .expect("valid stock regex")
});

static WEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(\d+(?:\.\d+)?)\s?(mg|g|kg|oz|lbs?|ml|l|fl\.?\s?oz|capsules|caps|tablets|softgels|tea\s?bags|count|ct)\b",
    )
    .expect("valid weight regex")
});

static INGREDIENTS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bingredients\s*:\s*(.+)").expect("valid ingredients regex")
});

/// Inventory strategies, in priority order; unknown stock falls back to the
/// configured default
pub const INVENTORY_STRATEGIES: &[Strategy<u32>] = &[
    out_of_stock_label,
    out_of_stock_structured,
    explicit_stock_count,
];

/// Weight strategies, in priority order
pub const WEIGHT_STRATEGIES: &[Strategy<String>] =
    &[weight_from_attributes, weight_from_structured, weight_from_text];

/// Ingredient strategies, in priority order
pub const INGREDIENT_STRATEGIES: &[Strategy<String>] =
    &[ingredients_from_block, ingredients_from_label];

fn out_of_stock_label(page: &ProductPage<'_>) -> Option<u32> {
    let container = product_container(page.document)?;

    let flagged = OUT_OF_STOCK_SELECTORS.iter().any(|css| {
        selector(css).is_some_and(|sel| container.select(&sel).any(|el| !is_hidden(el)))
    });
    let worded = AVAILABILITY_SELECTORS.iter().any(|css| {
        selector(css).is_some_and(|sel| {
            container.select(&sel).any(|el| {
                let text = element_text(el).to_lowercase();
                !is_hidden(el) && OUT_OF_STOCK_PHRASES.iter().any(|p| text.contains(p))
            })
        })
    });

    (flagged || worded).then_some(0)
}

fn out_of_stock_structured(page: &ProductPage<'_>) -> Option<u32> {
    let product = page.structured.as_ref()?;
    let sold_out = offers(product).into_iter().any(|offer| {
        text_field(offer, "availability")
            .is_some_and(|a| a.contains("OutOfStock") || a.contains("SoldOut"))
    });
    sold_out.then_some(0)
}

fn explicit_stock_count(page: &ProductPage<'_>) -> Option<u32> {
    let container = product_container(page.document)?;

    if let Some(sel) = selector("[data-stock], [data-inventory], [data-stock-quantity]") {
        let attribute = container.select(&sel).find_map(|el| {
            ["data-stock", "data-inventory", "data-stock-quantity"]
                .iter()
                .find_map(|attr| el.value().attr(attr))
                .and_then(|v| v.trim().parse::<u32>().ok())
        });
        if attribute.is_some() {
            return attribute;
        }
    }

    AVAILABILITY_SELECTORS.iter().find_map(|css| {
        let sel = selector(css)?;
        container.select(&sel).find_map(|el| {
            let text = element_text(el);
            let captures = STOCK_COUNT.captures(&text)?;
            captures
                .get(1)
                .or_else(|| captures.get(2))
                .and_then(|m| m.as_str().parse().ok())
        })
    })
}

/// Finds a magnitude-and-unit weight in free text
///
/// ```
/// use shelf_sweep::extract::stock::find_weight;
///
/// assert_eq!(find_weight("Ashwagandha 60 Capsules"), Some("60 Capsules".to_string()));
/// assert_eq!(find_weight("Loose tea, 250g pouch"), Some("250g".to_string()));
/// assert_eq!(find_weight("Calming tea"), None);
/// ```
pub fn find_weight(text: &str) -> Option<String> {
    WEIGHT.find(text).map(|m| collapse_whitespace(m.as_str()))
}

fn weight_from_attributes(page: &ProductPage<'_>) -> Option<String> {
    ATTRIBUTE_ROWS.iter().find_map(|css| {
        let sel = selector(css)?;
        let label_sel = selector("th, .label, td:first-child")?;
        let value_sel = selector("td")?;
        page.document.select(&sel).find_map(|row| {
            let label = row.select(&label_sel).next().map(element_text)?.to_lowercase();
            if !(label.contains("weight") || label.contains("size") || label.contains("net")) {
                return None;
            }
            let value = row.select(&value_sel).last().map(element_text)?;
            (!value.is_empty()).then_some(value)
        })
    })
}

fn weight_from_structured(page: &ProductPage<'_>) -> Option<String> {
    let product = page.structured.as_ref()?;
    match product.get("weight")? {
        Value::String(s) => Some(collapse_whitespace(s)).filter(|s| !s.is_empty()),
        weight @ Value::Object(_) => {
            let value = text_field(weight, "value")?;
            let unit = text_field(weight, "unitText")
                .or_else(|| text_field(weight, "unitCode"))
                .unwrap_or_default();
            Some(format!("{} {}", value, unit).trim().to_string())
        }
        _ => None,
    }
}

fn weight_from_text(page: &ProductPage<'_>) -> Option<String> {
    find_weight(&page.name).or_else(|| {
        let container = product_container(page.document)?;
        find_weight(&element_text(container))
    })
}

fn ingredients_from_block(page: &ProductPage<'_>) -> Option<String> {
    let text = first_text(page.document, INGREDIENT_BLOCKS)?;
    let text = text
        .strip_prefix("Ingredients")
        .map(|rest| rest.trim_start_matches(':').trim().to_string())
        .unwrap_or(text);
    cap_ingredients(&text)
}

fn ingredients_from_label(page: &ProductPage<'_>) -> Option<String> {
    let container = product_container(page.document)?;
    // Text nodes keep line structure; the label's value runs to the end of its line
    container.text().find_map(|line| {
        let captures = INGREDIENTS_LABEL.captures(line)?;
        cap_ingredients(captures.get(1)?.as_str())
    })
}

fn cap_ingredients(text: &str) -> Option<String> {
    let text = collapse_whitespace(text);
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(MAX_INGREDIENTS_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::super::first_of;
    use super::*;
    use scraper::Html;
    use url::Url;

    fn with_page<R>(html: &str, name: &str, f: impl FnOnce(&ProductPage<'_>) -> R) -> R {
        let doc = Html::parse_document(&format!(
            "<html><body><div class=\"product-detail\">{}</div></body></html>",
            html
        ));
        let url = Url::parse("https://s.com/product/tea/").unwrap();
        let mut page = ProductPage::new(&doc, &url, &[]);
        page.name = name.to_string();
        f(&page)
    }

    fn inventory(html: &str) -> Option<u32> {
        with_page(html, "Calm Tea", |page| first_of(page, INVENTORY_STRATEGIES))
    }

    #[test]
    fn test_visible_out_of_stock_label() {
        assert_eq!(inventory(r#"<p class="stock">Out of stock</p>"#), Some(0));
        assert_eq!(inventory(r#"<span class="sold-out">Sold</span>"#), Some(0));
    }

    #[test]
    fn test_hidden_out_of_stock_label_ignored() {
        let html = r#"<p class="stock out-of-stock" style="display:none">Out of stock</p>
                      <p class="availability">12 in stock</p>"#;
        assert_eq!(inventory(html), Some(12));
    }

    #[test]
    fn test_structured_out_of_stock() {
        let html = r#"<script type="application/ld+json">
            {"@type":"Product","offers":{"availability":"https://schema.org/OutOfStock"}}</script>"#;
        assert_eq!(inventory(html), Some(0));
    }

    #[test]
    fn test_stock_count_variants() {
        assert_eq!(inventory(r#"<div data-stock="7"></div>"#), Some(7));
        assert_eq!(inventory(r#"<p class="stock">Only 3 left</p>"#), Some(3));
        assert_eq!(inventory(r#"<p class="stock">In stock</p>"#), None);
    }

    #[test]
    fn test_weight_sources() {
        let weight = |html: &str, name: &str| {
            with_page(html, name, |page| first_of(page, WEIGHT_STRATEGIES))
        };

        assert_eq!(
            weight(
                r#"<table class="product-attributes"><tr><th>Net Weight</th><td>2 oz</td></tr></table>"#,
                "Calm Tea"
            ),
            Some("2 oz".to_string())
        );
        assert_eq!(
            weight(
                r#"<script type="application/ld+json">{"@type":"Product","weight":{"value":"500","unitText":"g"}}</script>"#,
                "Calm Tea"
            ),
            Some("500 g".to_string())
        );
        assert_eq!(weight("", "Turmeric 90 Softgels"), Some("90 Softgels".to_string()));
        assert_eq!(weight("<p>Nothing here</p>", "Calm Tea"), None);
    }

    #[test]
    fn test_ingredients_sources() {
        let ingredients =
            |html: &str| with_page(html, "Calm Tea", |page| first_of(page, INGREDIENT_STRATEGIES));

        assert_eq!(
            ingredients(r#"<div class="ingredients">Ingredients: chamomile, mint</div>"#),
            Some("chamomile, mint".to_string())
        );
        assert_eq!(
            ingredients("<p>Ingredients: rooibos, vanilla</p><p>Store cool</p>"),
            Some("rooibos, vanilla".to_string())
        );
        assert_eq!(ingredients("<p>Steep 5 minutes</p>"), None);
    }
}
