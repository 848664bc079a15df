//! JSON-LD structured data
//!
//! Storefront themes embed a schema.org `Product` object in
//! `<script type="application/ld+json">`. It may sit at the top level, inside
//! an array, or inside an `@graph`.

use crate::html::selector;
use scraper::Html;
use serde_json::Value;

/// Returns the first schema.org Product object embedded in the page
pub fn json_ld_product(document: &Html) -> Option<Value> {
    let scripts = selector("script[type='application/ld+json']")?;

    document.select(&scripts).find_map(|script| {
        let raw = script.text().collect::<String>();
        let parsed: Value = serde_json::from_str(raw.trim()).ok()?;
        find_product(&parsed).cloned()
    })
}

fn find_product(value: &Value) -> Option<&Value> {
    match value {
        Value::Array(items) => items.iter().find_map(find_product),
        Value::Object(map) => {
            if is_type(value, "Product") {
                return Some(value);
            }
            map.get("@graph").and_then(find_product)
        }
        _ => None,
    }
}

/// Returns true when `@type` is `kind` or an array containing it
pub fn is_type(value: &Value, kind: &str) -> bool {
    match value.get("@type") {
        Some(Value::String(t)) => t == kind,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(kind)),
        _ => false,
    }
}

/// Reads a field as text, accepting strings and numbers
pub fn text_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Reads a field that is either a string or an object with a `name`
pub fn named_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::Object(_) => text_field(value.get(key)?, "name"),
        Value::Array(items) => items.first().and_then(|first| match first {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(_) => text_field(first, "name"),
            _ => None,
        }),
        _ => text_field(value, key),
    }
    .filter(|s| !s.is_empty())
}

/// Returns the product's offers as a list, whether given as one object or many
pub fn offers(product: &Value) -> Vec<&Value> {
    match product.get("offers") {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(offer @ Value::Object(_)) => vec![offer],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> Html {
        Html::parse_document(&format!(
            r#"<html><head><script type="application/ld+json">{}</script></head><body></body></html>"#,
            json
        ))
    }

    #[test]
    fn test_top_level_product() {
        let product =
            json_ld_product(&doc(r#"{"@type":"Product","name":"Tea","sku":42}"#)).unwrap();
        assert_eq!(text_field(&product, "name"), Some("Tea".to_string()));
        assert_eq!(text_field(&product, "sku"), Some("42".to_string()));
    }

    #[test]
    fn test_graph_product() {
        let json = r#"{"@context":"https://schema.org","@graph":[
            {"@type":"WebPage","name":"Page"},
            {"@type":["Product","Thing"],"name":"Tea","brand":{"@type":"Brand","name":"Leafwise"}}
        ]}"#;
        let product = json_ld_product(&doc(json)).unwrap();
        assert_eq!(named_field(&product, "brand"), Some("Leafwise".to_string()));
    }

    #[test]
    fn test_invalid_json_ignored() {
        assert!(json_ld_product(&doc("{not json")).is_none());
        assert!(json_ld_product(&doc(r#"{"@type":"Organization"}"#)).is_none());
    }

    #[test]
    fn test_offers_object_or_array() {
        let single: Value = serde_json::json!({"offers": {"price": "9.99"}});
        assert_eq!(offers(&single).len(), 1);

        let many: Value = serde_json::json!({"offers": [{"price": 1}, {"price": 2}]});
        assert_eq!(offers(&many).len(), 2);
    }
}
