//! Scrape Australian property listings and judge them against a household's
//! deal-breaker rules.
//!
//! The pipeline takes a listing URL from realestate.com.au or domain.com.au,
//! renders it in headless Chrome, extracts and validates the listing fields,
//! and returns a canonical property record. The rule engine then evaluates
//! that record against the household policy and produces a verdict.
//!
//! ```no_run
//! use property_scout::{evaluate, scrape_listing, ChromeFetcher, FetchOptions, HouseholdPolicy};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let fetcher = ChromeFetcher::new(FetchOptions::default());
//! let url = "https://www.realestate.com.au/property-house-sa-angle+vale-144523456";
//! let property = scrape_listing(url, &fetcher).await?;
//! let verdict = evaluate(&property, &HouseholdPolicy::default(), None);
//! println!("{}", verdict.format_report());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
pub mod rules;
pub mod scrapers;

pub use error::{ScrapeError, ScrapeStage};
pub use models::{
    CanonicalProperty, DealBreakerFlags, FloodRiskLevel, ListingSource, PropertyType, SuburbKey,
    SuburbRiskContext, TriState,
};
pub use rules::{evaluate, DealBreakerVerdict, HouseholdPolicy, RuleKind, Severity};
pub use scrapers::{
    scrape_listing, ChromeFetcher, FetchOptions, PageFetcher, RenderedPage, RequestPacer,
    SiteExtractor,
};
