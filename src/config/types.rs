use serde::Deserialize;
use std::time::Duration;

/// Browser-like User-Agent sent with every request unless overridden
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Main configuration structure for Shelf-Sweep
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Builds a configuration for the given site root with every other
    /// option at its default value
    pub fn for_site(base_url: impl Into<String>) -> Self {
        Self {
            site: SiteConfig {
                base_url: base_url.into(),
                ..SiteConfig::default()
            },
            ..Self::default()
        }
    }
}

/// Target site description
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Root URL of the target store
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Category paths scanned even when the homepage does not link to them
    #[serde(rename = "fallback-category-paths", default = "default_fallback_paths")]
    pub fallback_category_paths: Vec<String>,

    /// Query parameter carrying the listing page number
    #[serde(rename = "pagination-param", default = "default_pagination_param")]
    pub pagination_param: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            fallback_category_paths: default_fallback_paths(),
            pagination_param: default_pagination_param(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Pause between consecutive requests of one worker (milliseconds)
    #[serde(rename = "politeness-delay", default = "default_politeness_delay")]
    pub politeness_delay: u64,

    /// Maximum number of listing pages fetched per category, page 1 included
    #[serde(rename = "max-pagination-depth", default = "default_max_pagination_depth")]
    pub max_pagination_depth: u32,

    /// Number of product-scraping workers
    #[serde(default = "default_workers")]
    pub workers: u32,

    /// Capacity of the progress event channel
    #[serde(rename = "progress-buffer", default = "default_progress_buffer")]
    pub progress_buffer: usize,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            politeness_delay: default_politeness_delay(),
            max_pagination_depth: default_max_pagination_depth(),
            workers: default_workers(),
            progress_buffer: default_progress_buffer(),
        }
    }
}

/// Request identification headers
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Full User-Agent header value
    #[serde(default = "default_user_agent")]
    pub value: String,

    /// Accept-Language header value
    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: default_user_agent(),
            accept_language: default_accept_language(),
        }
    }
}

/// Page classifier thresholds
///
/// These were tuned against one store's markup and usually need retuning for
/// a different theme.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// More product-style links than this marks a listing page
    #[serde(rename = "max-product-links", default = "default_max_product_links")]
    pub max_product_links: usize,

    /// Weak indicators required when no strong indicator is present
    #[serde(
        rename = "weak-indicator-threshold",
        default = "default_weak_indicator_threshold"
    )]
    pub weak_indicator_threshold: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_product_links: default_max_product_links(),
            weak_indicator_threshold: default_weak_indicator_threshold(),
        }
    }
}

/// Field extraction settings
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Brand names matched against product names when no brand element exists
    #[serde(rename = "known-brands", default)]
    pub known_brands: Vec<String>,

    /// Inventory assumed for products that are available but carry no count
    #[serde(rename = "default-inventory", default = "default_inventory")]
    pub default_inventory: u32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            known_brands: Vec::new(),
            default_inventory: default_inventory(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON dataset
    #[serde(rename = "json-path")]
    pub json_path: Option<String>,

    /// Path of the flattened CSV export
    #[serde(rename = "csv-path")]
    pub csv_path: Option<String>,

    /// Path of the markdown crawl summary
    #[serde(rename = "summary-path")]
    pub summary_path: Option<String>,
}

fn default_fallback_paths() -> Vec<String> {
    vec!["/shop/".to_string()]
}

fn default_pagination_param() -> String {
    "page".to_string()
}

fn default_request_timeout() -> u64 {
    20
}

fn default_politeness_delay() -> u64 {
    500
}

fn default_max_pagination_depth() -> u32 {
    37
}

fn default_workers() -> u32 {
    3
}

fn default_progress_buffer() -> usize {
    64
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_max_product_links() -> usize {
    5
}

fn default_weak_indicator_threshold() -> usize {
    3
}

fn default_inventory() -> u32 {
    100
}
