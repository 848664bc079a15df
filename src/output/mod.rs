//! Output module for writing crawl results
//!
//! This module handles:
//! - Writing the dataset as JSON and CSV
//! - Generating markdown summaries of crawl results
//! - Printing crawl statistics

mod csv_output;
mod json_output;
mod markdown;
pub mod stats;
mod traits;

pub use csv_output::{products_to_csv, CsvOutput, CSV_COLUMNS};
pub use json_output::{read_dataset_json, write_dataset_json, JsonOutput};
pub use markdown::{format_markdown_summary, generate_markdown_summary, MarkdownOutput};
pub use stats::print_statistics;
pub use traits::{CrawlSummary, OutputError, OutputHandler, OutputResult};

use crate::config::OutputConfig;

/// Boxed output handler as held by the coordinator
pub type BoxedOutput = Box<dyn OutputHandler + Send>;

/// Builds the output handlers named in the configuration
///
/// Handlers run in the order JSON, CSV, markdown summary. Paths left unset
/// produce no handler.
pub fn handlers_from_config(config: &OutputConfig) -> Vec<BoxedOutput> {
    let mut handlers: Vec<BoxedOutput> = Vec::new();

    if let Some(path) = &config.json_path {
        handlers.push(Box::new(JsonOutput::new(path)));
    }
    if let Some(path) = &config.csv_path {
        handlers.push(Box::new(CsvOutput::new(path)));
    }
    if let Some(path) = &config.summary_path {
        handlers.push(Box::new(MarkdownOutput::new(path)));
    }

    handlers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handlers_from_config() {
        let config = OutputConfig {
            json_path: Some("products.json".to_string()),
            csv_path: None,
            summary_path: Some("summary.md".to_string()),
        };

        let names: Vec<String> = handlers_from_config(&config)
            .iter()
            .map(|h| h.name().to_string())
            .collect();
        assert_eq!(names, vec!["json", "markdown"]);
    }

    #[test]
    fn test_no_paths_no_handlers() {
        let config = OutputConfig {
            json_path: None,
            csv_path: None,
            summary_path: None,
        };
        assert!(handlers_from_config(&config).is_empty());
    }
}
