/// Crawl phase definitions for the orchestrator state machine
///
/// This module defines every phase a crawl run passes through and which
/// transitions between them are legal.
use crate::progress::ProgressStage;
use std::fmt;

/// Represents the current phase of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Setup =====
    /// Coordinator built, nothing fetched yet
    Init,

    // ===== Discovery =====
    /// Fetching the homepage and collecting category/brand links
    DiscoveringCategories,

    /// Fetching the first page of each category or brand listing
    ScanningCategoryPages,

    /// Following page-number links of the current listing
    Paginating,

    // ===== Extraction =====
    /// Fetching and extracting product pages from the worklist
    ScrapingProducts,

    /// Handing the dataset to the output writers
    Saving,

    // ===== Terminal States =====
    /// Run finished (possibly cancelled) and the dataset was written
    Complete,

    /// Run aborted on an unrecoverable failure
    Error,
}

impl CrawlPhase {
    /// Returns true if this is a terminal phase
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error)
    }

    /// Checks whether moving from this phase to `next` is allowed
    ///
    /// `Error` is reachable from every non-terminal phase. Pagination nests
    /// inside category scanning, so the two alternate freely.
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Self::Error {
            return true;
        }

        matches!(
            (self, next),
            (Self::Init, Self::DiscoveringCategories)
                | (Self::DiscoveringCategories, Self::ScanningCategoryPages)
                | (Self::DiscoveringCategories, Self::ScrapingProducts)
                | (Self::ScanningCategoryPages, Self::Paginating)
                | (Self::Paginating, Self::ScanningCategoryPages)
                | (Self::ScanningCategoryPages, Self::ScrapingProducts)
                | (Self::Paginating, Self::ScrapingProducts)
                | (Self::ScrapingProducts, Self::Saving)
                | (Self::Saving, Self::Complete)
        )
    }

    /// Maps the phase onto the coarser stage reported to observers
    pub fn stage(&self) -> ProgressStage {
        match self {
            Self::Init => ProgressStage::Init,
            Self::DiscoveringCategories | Self::ScanningCategoryPages | Self::Paginating => {
                ProgressStage::Discovery
            }
            Self::ScrapingProducts => ProgressStage::ScrapingProducts,
            Self::Saving => ProgressStage::Saving,
            Self::Complete => ProgressStage::Complete,
            Self::Error => ProgressStage::Error,
        }
    }

    /// Returns a stable lowercase name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::DiscoveringCategories => "discovering_categories",
            Self::ScanningCategoryPages => "scanning_category_pages",
            Self::Paginating => "paginating",
            Self::ScrapingProducts => "scraping_products",
            Self::Saving => "saving",
            Self::Complete => "complete",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
