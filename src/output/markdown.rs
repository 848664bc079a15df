//! Markdown summary generation
//!
//! This module generates human-readable markdown summaries of crawl results,
//! including statistics, categories, brands and per-category product counts.

use crate::output::traits::{CrawlSummary, OutputHandler, OutputResult};
use crate::product::Dataset;
use crate::state::CrawlStats;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Generates a markdown summary from crawl statistics
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(summary);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
///
/// # Arguments
///
/// * `summary` - The crawl summary data
///
/// # Returns
///
/// A formatted markdown string
pub fn format_markdown_summary(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    // Title
    md.push_str("# Shelf-Sweep Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    if let Some(started) = &summary.started_at {
        md.push_str(&format!("- **Started**: {}\n", started));
    }
    if let Some(finished) = &summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished));
    }
    if let Some(duration) = summary.duration_seconds {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Status**: {}\n\n", summary.status));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Products**: {}\n", summary.total_products));
    md.push_str(&format!(
        "- **In Stock / Out of Stock**: {} / {}\n",
        summary.in_stock, summary.out_of_stock
    ));
    md.push_str(&format!("- **Pages Scanned**: {}\n", summary.pages_scanned));
    md.push_str(&format!(
        "- **Listing Pages Scanned**: {}\n",
        summary.categories_scanned
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n",
        summary.success_rate()
    ));
    md.push_str(&format!("- **Error Rate**: {:.2}%\n\n", summary.error_rate()));

    // Skip breakdown
    md.push_str("## Skipped Pages\n\n");
    md.push_str("| Reason | Count |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Fetch Errors | {} |\n", summary.errors));
    md.push_str(&format!(
        "| Not a Product Page | {} |\n",
        summary.non_product_pages
    ));
    md.push_str(&format!(
        "| Invalid Product | {} |\n",
        summary.invalid_products
    ));
    md.push_str(&format!(
        "| Duplicate | {} |\n\n",
        summary.duplicates_skipped
    ));

    // Per-category counts
    if !summary.products_per_category.is_empty() {
        md.push_str("## Products per Category\n\n");
        md.push_str("| Category | Products |\n");
        md.push_str("|----------|----------|\n");

        let mut counts: Vec<_> = summary.products_per_category.iter().collect();
        counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (category, count) in counts {
            let label = if category.is_empty() {
                "(uncategorized)"
            } else {
                category.as_str()
            };
            md.push_str(&format!("| {} | {} |\n", label, count));
        }
        md.push('\n');
    }

    if !summary.brands.is_empty() {
        md.push_str("## Brands\n\n");
        md.push_str(&format!("Total brands: {}\n\n", summary.brands.len()));
        for brand in summary.brands.iter().take(50) {
            md.push_str(&format!("- {}\n", brand));
        }
        if summary.brands.len() > 50 {
            md.push_str(&format!("\n... and {} more\n\n", summary.brands.len() - 50));
        } else {
            md.push('\n');
        }
    }

    md
}

/// Output handler writing the markdown summary
#[derive(Debug, Clone)]
pub struct MarkdownOutput {
    path: PathBuf,
}

impl MarkdownOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputHandler for MarkdownOutput {
    fn name(&self) -> &str {
        "markdown"
    }

    fn write(&mut self, dataset: &Dataset, stats: &CrawlStats) -> OutputResult<()> {
        let summary = CrawlSummary::from_run(dataset, stats);
        generate_markdown_summary(&summary, &self.path)?;
        tracing::info!("Wrote crawl summary to {}", self.path.display());
        Ok(())
    }
}
