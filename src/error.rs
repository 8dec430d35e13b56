use std::fmt;

use crate::models::ListingSource;

/// Pipeline stage a scrape failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeStage {
    /// Bad input: unsupported URL or a record missing mandatory fields.
    Validation,
    /// Browser launch, navigation or page capture failure.
    Fetch,
    /// Reading page content for the given source failed.
    Extraction(ListingSource),
}

impl fmt::Display for ScrapeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeStage::Validation => write!(f, "validation"),
            ScrapeStage::Fetch => write!(f, "fetch"),
            ScrapeStage::Extraction(source) => write!(f, "{}-extraction", source.slug()),
        }
    }
}

/// The error type for listing scrape operations.
///
/// Every failure carries the stage it happened in and the offending URL, so
/// callers can tell bad input from network trouble from a page-shape change
/// without reading logs. Fetch and extraction failures keep the underlying
/// cause chained in `source`.
#[derive(Debug, thiserror::Error)]
pub struct ScrapeError {
    pub stage: ScrapeStage,
    pub url: String,
    pub message: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for {}: {}", self.stage, self.url, self.message)?;
        if let Some(ref cause) = self.source {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

impl ScrapeError {
    /// Validation failure listing every problem found, not just the first.
    pub fn validation(url: impl Into<String>, problems: Vec<String>) -> Self {
        Self {
            stage: ScrapeStage::Validation,
            url: url.into(),
            message: problems.join("; "),
            source: None,
        }
    }

    /// Validation failure for a URL outside the supported portals.
    pub fn unsupported_source(url: impl Into<String>) -> Self {
        Self {
            stage: ScrapeStage::Validation,
            url: url.into(),
            message: "unsupported listing source (expected realestate.com.au or domain.com.au)"
                .to_string(),
            source: None,
        }
    }

    /// Fetch failure with the underlying cause.
    pub fn fetch(url: impl Into<String>, cause: anyhow::Error) -> Self {
        Self {
            stage: ScrapeStage::Fetch,
            url: url.into(),
            message: "could not capture a rendered page".to_string(),
            source: Some(cause),
        }
    }

    /// Extraction failure tagged with the source it happened on.
    pub fn extraction(site: ListingSource, url: impl Into<String>, cause: anyhow::Error) -> Self {
        Self {
            stage: ScrapeStage::Extraction(site),
            url: url.into(),
            message: "could not read listing fields from the page".to_string(),
            source: Some(cause),
        }
    }

    pub fn is_validation(&self) -> bool {
        self.stage == ScrapeStage::Validation
    }

    pub fn is_fetch(&self) -> bool {
        self.stage == ScrapeStage::Fetch
    }

    pub fn is_extraction(&self) -> bool {
        matches!(self.stage, ScrapeStage::Extraction(_))
    }
}
