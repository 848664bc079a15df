//! Statistics display for the command line

use crate::output::traits::CrawlSummary;

/// Formats statistics as plain text
///
/// # Arguments
///
/// * `summary` - The statistics to display
pub fn format_statistics(summary: &CrawlSummary) -> String {
    let mut out = String::new();

    out.push_str("=== Crawl Statistics ===\n\n");
    out.push_str(&format!("Status: {}\n", summary.status));
    if let Some(duration) = summary.duration_seconds {
        out.push_str(&format!("Duration: {}s\n", duration));
    }
    out.push('\n');

    out.push_str("Overview:\n");
    out.push_str(&format!("  Products extracted: {}\n", summary.total_products));
    out.push_str(&format!("  Categories: {}\n", summary.categories.len()));
    out.push_str(&format!("  Brands: {}\n", summary.brands.len()));
    out.push_str(&format!("  Pages scanned: {}\n", summary.pages_scanned));
    out.push_str(&format!(
        "  Listing pages scanned: {}\n",
        summary.categories_scanned
    ));
    out.push('\n');

    out.push_str("Skipped:\n");
    let mut skipped = [
        ("Fetch errors", summary.errors),
        ("Not a product page", summary.non_product_pages),
        ("Invalid product", summary.invalid_products),
        ("Duplicate", summary.duplicates_skipped),
    ];
    // Sort reasons by count (descending)
    skipped.sort_by(|a, b| b.1.cmp(&a.1));
    for (reason, count) in skipped {
        out.push_str(&format!("  {}: {}\n", reason, count));
    }
    out.push('\n');

    out.push_str(&format!(
        "Success Rate: {:.1}% ({} / {} worklist URLs became products)\n",
        summary.success_rate(),
        summary.total_products,
        summary.worklist_size
    ));

    out
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `summary` - The statistics to display
pub fn print_statistics(summary: &CrawlSummary) {
    print!("{}", format_statistics(summary));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_statistics() {
        let summary = CrawlSummary {
            status: "complete".to_string(),
            total_products: 3,
            worklist_size: 4,
            non_product_pages: 1,
            errors: 0,
            ..CrawlSummary::default()
        };

        let text = format_statistics(&summary);
        assert!(text.contains("Products extracted: 3"));
        assert!(text.contains("Success Rate: 75.0% (3 / 4 worklist URLs became products)"));

        let not_product = text.find("Not a product page: 1").unwrap();
        let errors = text.find("Fetch errors: 0").unwrap();
        assert!(not_product < errors);
    }
}
