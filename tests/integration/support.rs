//! Storefront fixtures shared by the integration tests

use shelf_sweep::config::{Config, CrawlerConfig, SiteConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a fast, single-worker configuration for the mock store
pub fn test_config(server: &MockServer) -> Config {
    Config {
        site: SiteConfig {
            base_url: format!("{}/", server.uri()),
            fallback_category_paths: vec![],
            ..SiteConfig::default()
        },
        crawler: CrawlerConfig {
            workers: 1,
            politeness_delay: 0,
            request_timeout: 10,
            ..CrawlerConfig::default()
        },
        ..Config::default()
    }
}

/// Wraps body markup in a full HTML document
pub fn html_page(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, body
    )
}

/// A product page with a SKU heading, a price and a description
pub fn product_page(name: &str, sku: &str, price: &str) -> String {
    html_page(
        &format!("{} | Example Shop", name),
        &format!(
            r#"<div class="product-detail">
                 <h1>{} SKU: {}</h1>
                 <p class="price">{}</p>
                 <div class="product-description"><p>Chamomile and lemon balm for restful sleep.</p></div>
               </div>"#,
            name, sku, price
        ),
    )
}

/// Anchors for the given hrefs
pub fn links(hrefs: &[&str]) -> String {
    hrefs
        .iter()
        .map(|href| format!(r#"<a href="{}">{}</a>"#, href, href))
        .collect()
}

/// Serves `body` for GET requests to `route`
pub async fn serve(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}
