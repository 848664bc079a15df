//! Shelf-Sweep: a product discovery-and-extraction crawler
//!
//! This crate walks an e-commerce site that has no stable API, discovers its
//! product pages through the homepage, category pages, brand pages and their
//! pagination, classifies every fetched page, extracts structured product data
//! and writes a normalized dataset.

pub mod categorize;
pub mod config;
pub mod crawler;
pub mod extract;
mod html;
pub mod output;
pub mod product;
pub mod progress;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Shelf-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Homepage {url} could not be fetched: {reason}")]
    HomepageUnavailable { url: String, reason: String },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Shelf-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport};
pub use product::{Dataset, Product, ProductImage};
pub use progress::{ProgressEvent, ProgressStage};
pub use state::{CrawlPhase, CrawlState, CrawlStats};
pub use url::normalize_url;
