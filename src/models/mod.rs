use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Supported listing portals
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ListingSource {
    RealEstateAu,
    DomainAu,
}

impl ListingSource {
    /// Short identifier used in logs and error stage tags
    pub fn slug(&self) -> &'static str {
        match self {
            ListingSource::RealEstateAu => "realestate",
            ListingSource::DomainAu => "domain",
        }
    }

    /// Portal hostname
    pub fn host(&self) -> &'static str {
        match self {
            ListingSource::RealEstateAu => "realestate.com.au",
            ListingSource::DomainAu => "domain.com.au",
        }
    }

    /// Classify a listing URL by hostname and path shape.
    ///
    /// Pure string work, no network. Malformed URLs and hosts outside the
    /// supported portals return `None`, which rejects the pipeline before
    /// any fetch happens.
    pub fn detect(url: &str) -> Option<ListingSource> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?;
        let path = parsed.path();

        [ListingSource::RealEstateAu, ListingSource::DomainAu]
            .into_iter()
            .find(|source| host_matches(host, source.host()) && source.path_matches(path))
    }

    /// Whether a path on the portal's own host can name a listing.
    fn path_matches(&self, path: &str) -> bool {
        match self {
            ListingSource::RealEstateAu => path.contains("property"),
            ListingSource::DomainAu => path.len() > 1,
        }
    }
}

/// Suffix match that only accepts the portal domain itself or its subdomains.
fn host_matches(host: &str, portal: &str) -> bool {
    match host.strip_suffix(portal) {
        Some(rest) => rest.is_empty() || rest.ends_with('.'),
        None => false,
    }
}

/// Three-valued flag: known-positive, known-negative or undetermined.
///
/// Listing pages rarely state a fact both ways, so absence of evidence is
/// kept distinct from evidence of absence. Rule checks decide per flag
/// whether `Unknown` counts for or against a property.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    KnownTrue,
    KnownFalse,
    #[default]
    Unknown,
}

impl TriState {
    /// Wrap a definite observation.
    pub fn known(value: bool) -> Self {
        if value {
            TriState::KnownTrue
        } else {
            TriState::KnownFalse
        }
    }

    pub fn is_known_true(&self) -> bool {
        matches!(self, TriState::KnownTrue)
    }

    pub fn is_known_false(&self) -> bool {
        matches!(self, TriState::KnownFalse)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, TriState::Unknown)
    }
}

/// Broad dwelling classification
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    #[default]
    House,
    Apartment,
    Townhouse,
    Villa,
    Land,
}

/// Role of an image within a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    Photo,
    Floorplan,
    Map,
}

/// An image attached to a listing; `order` preserves document order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyImage {
    pub url: String,
    pub role: ImageRole,
    pub order: u32,
}

/// Listing agent contact details, all best-effort
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AgentContact {
    pub name: Option<String>,
    pub agency: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl AgentContact {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.agency.is_none() && self.phone.is_none() && self.email.is_none()
    }
}

/// Tri-state facts the rule engine evaluates
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DealBreakerFlags {
    pub flood_risk: TriState,
    pub multi_story: TriState,
    pub adequate_parking: TriState,
    pub solar_panels: TriState,
    pub pet_friendly_yard: TriState,
    pub main_road: TriState,
    pub power_lines: TriState,
}

/// Canonical property record produced by the normalizer.
///
/// Built once from a raw extraction, validated once, then treated as
/// immutable. Re-scraping the same URL produces a fresh record; nothing is
/// merged in place. `raw_data` keeps the serialized extraction snapshot for
/// audit and provenance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CanonicalProperty {
    pub listing_id: String,
    pub source: ListingSource,
    pub url: String,
    pub address: String,
    pub suburb: String,
    pub state: String,
    pub postcode: String,
    pub price_display: String,
    pub price_min: Option<u64>,
    pub price_max: Option<u64>,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub parking: u32,
    pub living_areas: Option<u32>,
    pub land_size_sqm: Option<u32>,
    pub property_type: PropertyType,
    pub description: String,
    pub features: Vec<String>,
    pub images: Vec<PropertyImage>,
    pub agent: Option<AgentContact>,
    pub flags: DealBreakerFlags,
    pub listing_date: Option<NaiveDate>,
    pub days_on_market: Option<u32>,
    pub scraped_at: DateTime<Utc>,
    pub raw_data: serde_json::Value,
}

impl CanonicalProperty {
    /// Price used for budget comparisons: range maximum, else minimum, else zero.
    pub fn effective_price(&self) -> u64 {
        self.price_max.or(self.price_min).unwrap_or(0)
    }

    /// Lookup key for the suburb intelligence collaborator.
    pub fn suburb_key(&self) -> SuburbKey {
        SuburbKey {
            suburb: self.suburb.clone(),
            state: self.state.clone(),
        }
    }
}

/// Coarse flood-risk classification supplied by the suburb research subsystem
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FloodRiskLevel {
    Low,
    Medium,
    High,
}

/// Lookup key linking a property to its suburb record.
///
/// Suburb names repeat across states, so the state is part of the key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SuburbKey {
    pub suburb: String,
    pub state: String,
}

impl SuburbKey {
    /// Case-folded form used for context lookups.
    fn folded(&self) -> String {
        format!("{}|{}", self.suburb.to_lowercase(), self.state.to_lowercase())
    }
}

/// Read-only suburb intelligence from the external research subsystem.
///
/// Lookups are keyed by suburb and state, matched case-insensitively. The
/// pipeline never writes to this; it is evidence for the rule engine only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuburbRiskContext {
    flood_risk: HashMap<String, FloodRiskLevel>,
}

impl SuburbRiskContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the flood-risk level for a suburb.
    pub fn set_flood_risk(&mut self, suburb: &str, state: &str, level: FloodRiskLevel) {
        let key = SuburbKey {
            suburb: suburb.to_string(),
            state: state.to_string(),
        };
        self.flood_risk.insert(key.folded(), level);
    }

    /// Flood-risk level for a suburb, if the collaborator supplied one.
    pub fn flood_risk(&self, key: &SuburbKey) -> Option<FloodRiskLevel> {
        self.flood_risk.get(&key.folded()).copied()
    }
}
