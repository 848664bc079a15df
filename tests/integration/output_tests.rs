//! Output tests: the crawler writing its dataset through output handlers

use crate::support::{html_page, links, product_page, serve, test_config};
use shelf_sweep::config::OutputConfig;
use shelf_sweep::crawler::Coordinator;
use shelf_sweep::output::{read_dataset_json, JsonOutput, CSV_COLUMNS};
use shelf_sweep::SweepError;
use tempfile::TempDir;
use wiremock::MockServer;

async fn single_product_store() -> MockServer {
    let server = MockServer::start().await;

    serve(&server, "/", html_page("Home", &links(&["/category/teas/"]))).await;
    serve(
        &server,
        "/category/teas/",
        html_page("Teas", &links(&["/product/valid-herb-tea/"])),
    )
    .await;
    serve(
        &server,
        "/product/valid-herb-tea/",
        product_page("Valid Herb Tea", "100", "$9.99"),
    )
    .await;

    server
}

#[tokio::test]
async fn test_configured_outputs_written() {
    let server = single_product_store().await;
    let dir = TempDir::new().unwrap();
    let json_path = dir.path().join("products.json");
    let csv_path = dir.path().join("products.csv");
    let summary_path = dir.path().join("summary.md");

    let mut config = test_config(&server);
    config.output = OutputConfig {
        json_path: Some(json_path.to_string_lossy().into_owned()),
        csv_path: Some(csv_path.to_string_lossy().into_owned()),
        summary_path: Some(summary_path.to_string_lossy().into_owned()),
    };

    let report = Coordinator::new(config).unwrap().run().await.unwrap();

    // JSON reproduces the dataset
    let from_disk = read_dataset_json(&json_path).unwrap();
    assert_eq!(from_disk, report.dataset);

    // CSV has a header and one row
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next().unwrap(), CSV_COLUMNS.join(","));
    let row = lines.next().unwrap();
    assert!(row.starts_with("100,Valid Herb Tea,"));
    assert!(row.ends_with(",true,false"));
    assert!(lines.next().is_none());

    let summary = std::fs::read_to_string(&summary_path).unwrap();
    assert!(summary.contains("- **Products**: 1"));
    assert!(summary.contains("| Teas | 1 |"));
}

#[tokio::test]
async fn test_output_failure_is_fatal() {
    let server = single_product_store().await;
    let dir = TempDir::new().unwrap();
    let unwritable = dir.path().join("missing-dir").join("products.json");

    let result = Coordinator::new(test_config(&server))
        .unwrap()
        .with_output(Box::new(JsonOutput::new(unwritable)))
        .run()
        .await;

    assert!(matches!(result, Err(SweepError::Output(_))));
}
