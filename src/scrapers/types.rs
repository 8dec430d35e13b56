use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::models::{ImageRole, TriState};
use crate::scrapers::limiter::MIN_REQUEST_INTERVAL;

/// Realistic desktop browser identification presented to the portals.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// An image reference as found in the page, in document order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawImage {
    pub url: String,
    pub role: ImageRole,
}

/// Loosely typed field bag produced by a site extractor.
///
/// Every field is optional; a selector chain that matches nothing simply
/// leaves its field absent. The normalizer decides what is mandatory.
/// Counts are never defaulted to zero here, so "unknown" stays
/// distinguishable from "none".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawExtraction {
    pub address: Option<String>,
    pub price_display: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub parking: Option<u32>,
    pub living_areas: Option<u32>,
    pub land_size_sqm: Option<u32>,
    pub property_type: Option<String>,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub images: Vec<RawImage>,
    pub agent_name: Option<String>,
    pub agent_agency: Option<String>,
    pub agent_phone: Option<String>,
    pub agent_email: Option<String>,
    pub listing_date: Option<String>,
    pub days_on_market: Option<u32>,
    pub multi_story: TriState,
    pub solar_panels: TriState,
    pub pet_friendly_yard: TriState,
}

/// Fetch controller tuning knobs
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Client identification string sent with every request
    pub user_agent: String,
    /// Fixed viewport, width by height
    pub viewport: (u32, u32),
    /// Ceiling on navigation, not on the whole fetch
    pub nav_timeout: Duration,
    /// Fixed wait after the DOM parse for late-rendered content
    pub settle_delay: Duration,
    /// Minimum spacing between page loads
    pub min_request_interval: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            viewport: (1366, 768),
            nav_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(3),
            min_request_interval: MIN_REQUEST_INTERVAL,
        }
    }
}
