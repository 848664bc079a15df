//! Product images
//!
//! Unlike the other fields, images are not first-match: every source
//! contributes and the union is deduplicated by absolute URL.

use super::ProductPage;
use crate::html::{meta_content, selector};
use crate::product::ProductImage;
use crate::url::resolve_link;
use serde_json::Value;
use std::collections::HashSet;

const GALLERY_CONTAINERS: &[&str] = &[
    ".woocommerce-product-gallery",
    ".product-gallery",
    ".product-images",
    ".product-media",
    ".product__media",
    "[data-gallery]",
];

/// Image attributes, best quality first
const IMAGE_ATTRIBUTES: &[&str] = &["data-large_image", "data-zoom-image", "data-src", "src"];

/// URL fragments of images that are not product photos
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "placeholder",
    "spacer",
    "blank.gif",
    "/icons/",
    "icon-",
    "-icon.",
    "logo",
    "loading",
    "pixel.gif",
    "1x1",
];

type ImageSource = fn(&ProductPage<'_>) -> Vec<(String, String)>;

const IMAGE_SOURCES: &[ImageSource] = &[from_structured, from_og_image, from_gallery];

/// Collects product images from every source
///
/// Images are ordered by source (structured data, `og:image`, gallery) and
/// by position within a source. An image without alt text gets the product
/// name.
pub fn extract_images(page: &ProductPage<'_>) -> Vec<ProductImage> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();

    for source in IMAGE_SOURCES {
        for (raw, alt) in source(page) {
            let Some(url) = resolve_link(&raw, page.url) else {
                continue;
            };
            let url = url.to_string();
            if is_placeholder(&url) || !seen.insert(url.clone()) {
                continue;
            }
            let alt_text = if alt.trim().is_empty() {
                page.name.clone()
            } else {
                alt.trim().to_string()
            };
            images.push(ProductImage { url, alt_text });
        }
    }

    images
}

/// Returns true for spacer, icon, logo and similar non-product images
pub fn is_placeholder(url: &str) -> bool {
    let lower = url.to_lowercase();
    PLACEHOLDER_PATTERNS.iter().any(|p| lower.contains(p))
}

fn from_structured(page: &ProductPage<'_>) -> Vec<(String, String)> {
    let Some(image) = page.structured.as_ref().and_then(|p| p.get("image")) else {
        return Vec::new();
    };

    let entries: Vec<&Value> = match image {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::String(url) => Some((url.clone(), String::new())),
            Value::Object(map) => map
                .get("url")
                .or_else(|| map.get("contentUrl"))
                .and_then(Value::as_str)
                .map(|url| {
                    let caption = map
                        .get("caption")
                        .and_then(Value::as_str)
                        .unwrap_or_default();
                    (url.to_string(), caption.to_string())
                }),
            _ => None,
        })
        .collect()
}

fn from_og_image(page: &ProductPage<'_>) -> Vec<(String, String)> {
    meta_content(page.document, "og:image")
        .map(|url| vec![(url, String::new())])
        .unwrap_or_default()
}

fn from_gallery(page: &ProductPage<'_>) -> Vec<(String, String)> {
    let Some(images) = selector("img") else {
        return Vec::new();
    };

    GALLERY_CONTAINERS
        .iter()
        .filter_map(|css| selector(css))
        .flat_map(|container_sel| {
            page.document
                .select(&container_sel)
                .flat_map(|container| container.select(&images))
                .filter_map(|img| {
                    let src = IMAGE_ATTRIBUTES
                        .iter()
                        .find_map(|attr| img.value().attr(attr))
                        .filter(|src| !src.trim().is_empty())?;
                    let alt = img.value().attr("alt").unwrap_or_default();
                    Some((src.to_string(), alt.to_string()))
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;
    use url::Url;

    fn images_of(html: &str) -> Vec<ProductImage> {
        let doc = Html::parse_document(html);
        let url = Url::parse("https://shop.example.com/product/tea/").unwrap();
        let mut page = ProductPage::new(&doc, &url, &[]);
        page.name = "Lavender Calm Tea".to_string();
        extract_images(&page)
    }

    #[test]
    fn test_union_dedup_and_order() {
        let html = r#"<html><head>
            <meta property="og:image" content="https://shop.example.com/img/a.jpg">
            <script type="application/ld+json">{"@type":"Product","image":["/img/b.jpg","https://shop.example.com/img/a.jpg"]}</script>
            </head><body>
            <div class="product-gallery">
              <img src="/img/a.jpg" alt="Front">
              <img data-src="//cdn.example.com/img/c.jpg" src="/img/loading.gif" alt="Side">
            </div></body></html>"#;
        let urls: Vec<String> = images_of(html).into_iter().map(|i| i.url).collect();
        assert_eq!(
            urls,
            vec![
                "https://shop.example.com/img/b.jpg",
                "https://shop.example.com/img/a.jpg",
                "https://cdn.example.com/img/c.jpg",
            ]
        );
    }

    #[test]
    fn test_placeholders_dropped() {
        let html = r#"<div class="product-images">
            <img src="/assets/placeholder.png"><img src="/img/site-logo.png"><img src="/img/real.jpg">
        </div>"#;
        let images = images_of(html);
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, "https://shop.example.com/img/real.jpg");
        assert_eq!(images[0].alt_text, "Lavender Calm Tea");
    }

    #[test]
    fn test_images_outside_gallery_ignored() {
        let html = r#"<header><img src="/img/banner.jpg"></header>"#;
        assert!(images_of(html).is_empty());
    }
}
