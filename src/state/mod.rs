//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the orchestrator's state machine (discovery, scraping, saving, ...)
//! - `CrawlState`: visited set, worklist, link attribution, product accumulator and counters
//! - `CrawlStats`: the counters reported at the end of a run

mod crawl_phase;
mod crawl_state;

pub use crawl_phase::CrawlPhase;
pub use crawl_state::{CrawlState, CrawlStats, InsertOutcome, LinkMetadata};
