//! End-to-end crawl tests
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! discovery, scraping and saving cycle.

use crate::support::{html_page, links, product_page, serve, test_config};
use shelf_sweep::crawler::Coordinator;
use shelf_sweep::progress::{ProgressEvent, ProgressStage};
use shelf_sweep::SweepError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

#[tokio::test]
async fn test_full_crawl_single_category() {
    let server = MockServer::start().await;

    // Homepage product links are not scraped; only listings are followed
    serve(
        &server,
        "/",
        html_page(
            "Example Shop",
            &links(&["/category/herbal-teas/", "/product/homepage-special/"]),
        ),
    )
    .await;

    // Both pages of the listing carry the same links, so pagination stops at page 2
    Mock::given(method("GET"))
        .and(path("/category/herbal-teas/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page(
            "Herbal Teas",
            &format!(
                "<h1>Herbal Teas</h1>{}",
                links(&["/product/valid-herb-tea/", "/product/shop-all/"])
            ),
        )))
        .expect(2)
        .mount(&server)
        .await;

    serve(
        &server,
        "/product/valid-herb-tea/",
        product_page("Valid Herb Tea", "100", "$9.99"),
    )
    .await;

    // A catalog page under a product path, linking 8 other products that
    // are never mounted and so must never be requested
    let siblings: Vec<String> = (1..=8).map(|i| format!("/product/sibling-tea-{}/", i)).collect();
    let sibling_refs: Vec<&str> = siblings.iter().map(String::as_str).collect();
    serve(
        &server,
        "/product/shop-all/",
        html_page("Shop", &format!("<h1>Shop</h1>{}", links(&sibling_refs))),
    )
    .await;

    let report = Coordinator::new(test_config(&server))
        .expect("Failed to create coordinator")
        .run()
        .await
        .expect("Crawl failed");

    let products = &report.dataset.products;
    assert_eq!(products.len(), 1, "unexpected products: {:?}", products);

    let tea = &products[0];
    assert_eq!(tea.name, "Valid Herb Tea");
    assert_eq!(tea.sku, "100");
    assert_eq!(tea.price, 9.99);
    assert_eq!(tea.category, "Herbal Teas");
    assert_eq!(tea.health_categories, vec!["sleep-relaxation"]);
    assert_eq!(
        tea.url,
        format!("{}/product/valid-herb-tea/", server.uri())
    );

    assert!(products.iter().all(|p| !p.url.contains("sibling-tea")));

    let stats = &report.stats;
    assert_eq!(stats.non_product_pages, 1);
    assert_eq!(stats.worklist_size, 2);
    assert_eq!(stats.categories_scanned, 1);
    assert_eq!(stats.errors, 0);

    let requested: Vec<String> = server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect();
    assert!(requested.iter().all(|path| !path.contains("sibling-tea")));
    assert!(!stats.cancelled);
    assert_eq!(report.dataset.categories, vec!["Herbal Teas"]);
}

#[tokio::test]
async fn test_pagination_stops_on_first_page_without_new_links() {
    let server = MockServer::start().await;

    serve(&server, "/", html_page("Home", &links(&["/category/vitamins/"]))).await;

    // Page 1 -> a, b; page 2 -> c; page 3 -> c again; later pages would add more
    Mock::given(method("GET"))
        .and(path("/category/vitamins/"))
        .respond_with(|request: &Request| {
            let page = request
                .url
                .query_pairs()
                .find(|(k, _)| k == "page")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_else(|| "1".to_string());
            let hrefs: &[&str] = match page.as_str() {
                "1" => &["/product/vitamin-a/", "/product/vitamin-b/"],
                "2" | "3" => &["/product/vitamin-c/"],
                _ => &["/product/vitamin-z/"],
            };
            ResponseTemplate::new(200).set_body_string(html_page("Vitamins", &links(hrefs)))
        })
        .expect(3)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/product/vitamin-[a-z]/$"))
        .respond_with(|request: &Request| {
            let slug = request.url.path().trim_matches('/').replace("product/", "");
            ResponseTemplate::new(200).set_body_string(product_page(
                &format!("Daily {} Tablets", slug),
                &slug,
                "$12.00",
            ))
        })
        .mount(&server)
        .await;

    let report = Coordinator::new(test_config(&server))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.stats.worklist_size, 3);
    assert_eq!(report.dataset.total_products, 3);
    assert!(report
        .dataset
        .products
        .iter()
        .all(|p| p.category == "Vitamins"));
}

#[tokio::test]
async fn test_pagination_never_exceeds_ceiling() {
    let server = MockServer::start().await;

    serve(&server, "/", html_page("Home", &links(&["/brand/leafwise/"]))).await;

    // Every page adds a new product link
    Mock::given(method("GET"))
        .and(path("/brand/leafwise/"))
        .respond_with(|request: &Request| {
            let page = request
                .url
                .query_pairs()
                .find(|(k, _)| k == "page")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_else(|| "1".to_string());
            let href = format!("/product/leafwise-{}/", page);
            ResponseTemplate::new(200).set_body_string(html_page("Leafwise", &links(&[&href])))
        })
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/product/leafwise-\d+/$"))
        .respond_with(|request: &Request| {
            let slug = request.url.path().trim_matches('/').replace("product/", "");
            ResponseTemplate::new(200).set_body_string(product_page(
                "Leafwise Peppermint Tea",
                &slug,
                "$5.50",
            ))
        })
        .mount(&server)
        .await;

    let mut config = test_config(&server);
    config.crawler.max_pagination_depth = 2;

    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.stats.worklist_size, 2);
    assert_eq!(report.dataset.total_products, 2);
    // Brand listings attribute the brand, not the category
    assert!(report.dataset.products.iter().all(|p| p.brand == "Leafwise"));
}

#[tokio::test]
async fn test_duplicate_sku_skipped() {
    let server = MockServer::start().await;

    serve(&server, "/", html_page("Home", &links(&["/category/teas/"]))).await;
    serve(
        &server,
        "/category/teas/",
        html_page(
            "Teas",
            &links(&["/product/green-tea/", "/product/green-tea-gift/"]),
        ),
    )
    .await;
    serve(
        &server,
        "/product/green-tea/",
        product_page("Organic Green Tea", "GT-1", "$6.00"),
    )
    .await;
    serve(
        &server,
        "/product/green-tea-gift/",
        product_page("Organic Green Tea Gift", "GT-1", "$8.00"),
    )
    .await;

    let report = Coordinator::new(test_config(&server))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.dataset.total_products, 1);
    assert_eq!(report.dataset.products[0].name, "Organic Green Tea");
    assert_eq!(report.stats.duplicates_skipped, 1);
}

#[tokio::test]
async fn test_product_fetch_failure_counted() {
    let server = MockServer::start().await;

    serve(&server, "/", html_page("Home", &links(&["/category/teas/"]))).await;
    serve(
        &server,
        "/category/teas/",
        html_page("Teas", &links(&["/product/missing-tea/"])),
    )
    .await;

    let report = Coordinator::new(test_config(&server))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(report.dataset.total_products, 0);
    assert_eq!(report.stats.errors, 1);
}

#[tokio::test]
async fn test_homepage_failure_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (tx, mut rx) = mpsc::channel(16);
    let result = Coordinator::new(test_config(&server))
        .unwrap()
        .with_progress(tx)
        .run()
        .await;

    assert!(matches!(
        result,
        Err(SweepError::HomepageUnavailable { .. })
    ));

    let mut last = None;
    while let Some(event) = rx.recv().await {
        last = Some(event);
    }
    assert_eq!(last.map(|e| e.stage), Some(ProgressStage::Error));
}

#[tokio::test]
async fn test_cancelled_crawl_still_saves() {
    let server = MockServer::start().await;

    serve(&server, "/", html_page("Home", &links(&["/category/teas/"]))).await;
    Mock::given(method("GET"))
        .and(path("/category/teas/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(html_page("Teas", "")))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = Coordinator::new(test_config(&server))
        .unwrap()
        .with_cancellation(cancel)
        .run()
        .await
        .expect("A cancelled crawl still produces a report");

    assert!(report.stats.cancelled);
    assert_eq!(report.dataset.total_products, 0);
    assert_eq!(report.stats.pages_scanned, 1);
}

#[tokio::test]
async fn test_progress_events() {
    let server = MockServer::start().await;

    serve(&server, "/", html_page("Home", &links(&["/category/teas/"]))).await;
    serve(
        &server,
        "/category/teas/",
        html_page(
            "Teas",
            &links(&["/product/mint-tea/", "/product/rooibos-tea/"]),
        ),
    )
    .await;
    serve(
        &server,
        "/product/mint-tea/",
        product_page("Fresh Mint Tea", "MT-1", "$4.00"),
    )
    .await;
    serve(
        &server,
        "/product/rooibos-tea/",
        product_page("Red Rooibos Tea", "RT-1", "$4.50"),
    )
    .await;

    let (tx, mut rx) = mpsc::channel(64);
    let report = Coordinator::new(test_config(&server))
        .unwrap()
        .with_progress(tx)
        .run()
        .await
        .unwrap();

    let mut events: Vec<ProgressEvent> = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.first().map(|e| e.stage), Some(ProgressStage::Init));
    assert!(events.iter().any(|e| e.stage == ProgressStage::Discovery));
    assert!(events.iter().any(|e| e.stage == ProgressStage::Saving));
    let complete = events.last().unwrap();
    assert_eq!(complete.stage, ProgressStage::Complete);
    assert_eq!(complete.percentage, 100);
    assert_eq!(complete.products_found, report.dataset.total_products);

    let scraping: Vec<&ProgressEvent> = events
        .iter()
        .filter(|e| e.stage == ProgressStage::ScrapingProducts)
        .collect();
    assert!(scraping.iter().all(|e| e.total == 2));
    assert!(scraping
        .windows(2)
        .all(|pair| pair[0].percentage <= pair[1].percentage));
    assert_eq!(scraping.last().unwrap().percentage, 100);
}
