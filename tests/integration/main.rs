//! Integration tests for Shelf-Sweep
//!
//! Every test runs the crawler against a wiremock server standing in for a
//! storefront.

mod crawl_tests;
mod output_tests;
mod support;
