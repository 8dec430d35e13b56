use anyhow::Result;
use async_trait::async_trait;

use crate::error::ScrapeError;
use crate::models::ListingSource;
use crate::scrapers::types::RawExtraction;

/// A rendered listing page: final DOM serialized back to HTML
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub url: String,
    pub html: String,
}

impl RenderedPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// Common trait for page fetchers.
/// This allows tests and embedders to substitute canned pages for the real
/// browser session.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch and render the page at `url`.
    ///
    /// Implementations own their pacing; callers just await. Failures are
    /// fetch-stage errors and are never retried here.
    async fn fetch(&self, url: &str) -> Result<RenderedPage, ScrapeError>;
}

/// Common trait for per-source field extractors.
/// One implementation per portal; each keeps its selector fallback chains
/// private behind this uniform contract.
pub trait SiteExtractor: Send + Sync {
    /// The source this extractor understands.
    fn source(&self) -> ListingSource;

    /// Pull raw fields out of a rendered page.
    ///
    /// A field whose selectors match nothing is simply absent from the
    /// result; only page-level failures are errors.
    fn extract(&self, page: &RenderedPage) -> Result<RawExtraction>;
}
