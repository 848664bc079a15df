//! JSON dataset output
//!
//! The dataset is written as one pretty-printed document:
//! `{products, categories, brands, scrapedAt, totalProducts}`.

use crate::output::traits::{OutputHandler, OutputResult};
use crate::product::Dataset;
use crate::state::CrawlStats;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Writes a dataset to `path` as pretty-printed JSON
pub fn write_dataset_json(dataset: &Dataset, path: &Path) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, dataset)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Reads a dataset previously written by [`write_dataset_json`]
pub fn read_dataset_json(path: &Path) -> OutputResult<Dataset> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Output handler writing the JSON dataset file
#[derive(Debug, Clone)]
pub struct JsonOutput {
    path: PathBuf,
}

impl JsonOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputHandler for JsonOutput {
    fn name(&self) -> &str {
        "json"
    }

    fn write(&mut self, dataset: &Dataset, _stats: &CrawlStats) -> OutputResult<()> {
        write_dataset_json(dataset, &self.path)?;
        tracing::info!(
            "Wrote {} products to {}",
            dataset.total_products,
            self.path.display()
        );
        Ok(())
    }
}
