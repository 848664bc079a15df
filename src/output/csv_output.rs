//! CSV product export
//!
//! One row per product. Multi-valued fields are comma-joined inside a single
//! quoted cell. Every exported product is active and none is featured.

use crate::output::traits::{OutputHandler, OutputResult};
use crate::product::{Dataset, Product};
use crate::state::CrawlStats;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

/// Column headers, in output order
pub const CSV_COLUMNS: &[&str] = &[
    "sku",
    "name",
    "brand",
    "category",
    "price",
    "weight",
    "inventory",
    "short_description",
    "description",
    "health_categories",
    "images",
    "active",
    "featured",
];

/// Writes products as CSV to any writer
pub fn products_to_csv<W: Write>(products: &[Product], writer: W) -> OutputResult<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(CSV_COLUMNS)?;

    for product in products {
        let images = product
            .images
            .iter()
            .map(|image| image.url.as_str())
            .collect::<Vec<_>>()
            .join(",");

        let price = format!("{:.2}", product.price);
        let inventory = product.inventory_quantity.to_string();
        let health_categories = product.health_categories.join(",");

        csv.write_record([
            product.sku.as_str(),
            product.name.as_str(),
            product.brand.as_str(),
            product.category.as_str(),
            price.as_str(),
            product.weight.as_str(),
            inventory.as_str(),
            product.short_description.as_str(),
            product.description.as_str(),
            health_categories.as_str(),
            images.as_str(),
            "true",
            "false",
        ])?;
    }

    csv.flush()?;
    Ok(())
}

/// Output handler writing the CSV product file
#[derive(Debug, Clone)]
pub struct CsvOutput {
    path: PathBuf,
}

impl CsvOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputHandler for CsvOutput {
    fn name(&self) -> &str {
        "csv"
    }

    fn write(&mut self, dataset: &Dataset, _stats: &CrawlStats) -> OutputResult<()> {
        let file = File::create(&self.path)?;
        products_to_csv(&dataset.products, file)?;
        tracing::info!("Wrote CSV export to {}", self.path.display());
        Ok(())
    }
}
