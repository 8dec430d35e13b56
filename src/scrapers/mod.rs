use tracing::info;

use crate::error::ScrapeError;
use crate::models::{CanonicalProperty, ListingSource};

pub mod browser;
pub mod domain_au;
pub mod limiter;
pub mod normalize;
pub mod realestate;
pub mod select;
pub mod traits;
pub mod types;

pub use browser::ChromeFetcher;
pub use limiter::RequestPacer;
pub use traits::{PageFetcher, RenderedPage, SiteExtractor};
pub use types::{FetchOptions, RawExtraction};

/// Extractor for a detected listing source.
pub fn extractor_for(source: ListingSource) -> &'static dyn SiteExtractor {
    match source {
        ListingSource::RealEstateAu => &realestate::RealEstateAuExtractor,
        ListingSource::DomainAu => &domain_au::DomainAuExtractor,
    }
}

/// Scrape one listing URL into a validated canonical record.
///
/// Detection happens before any network activity, so unsupported URLs are
/// rejected without a fetch. The remaining stages run in order: fetch the
/// rendered page, extract raw fields with the source's selector chains,
/// then normalize and validate.
pub async fn scrape_listing(
    url: &str,
    fetcher: &dyn PageFetcher,
) -> Result<CanonicalProperty, ScrapeError> {
    let Some(source) = ListingSource::detect(url) else {
        return Err(ScrapeError::unsupported_source(url));
    };

    info!("Scraping {} listing: {}", source.slug(), url);
    let page = fetcher.fetch(url).await?;
    let raw = extractor_for(source)
        .extract(&page)
        .map_err(|cause| ScrapeError::extraction(source, url, cause))?;
    normalize::normalize_listing(source, url, raw)
}
