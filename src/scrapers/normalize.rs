use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;
use url::form_urlencoded;

use crate::error::ScrapeError;
use crate::models::{
    AgentContact, CanonicalProperty, DealBreakerFlags, ListingSource, PropertyImage, PropertyType,
    TriState,
};
use crate::scrapers::types::RawExtraction;

/// Price label: one or two $-amounts with thousands separators, optionally
/// joined by a range dash.
static PRICE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s*(\d[\d,]*)(?:\s*[-–—]\s*\$?\s*(\d[\d,]*))?").unwrap());

/// Trailing "<state> <postcode>" on the last address segment, e.g. "SA 5117".
static STATE_POSTCODE_TAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b([A-Za-z]{2,3})\s+(\d{4})\s*$").unwrap());

static REALESTATE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"property-[^/]*-(\d{6,})").unwrap());
static DOMAIN_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"-(\d{7,})(?:[/?#]|$)").unwrap());
static GENERIC_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{6,})").unwrap());

const DATE_FORMATS: &[&str] = &["%d %b %Y", "%d %B %Y", "%Y-%m-%d", "%d/%m/%Y"];

/// A car count at or above this is enough for the household.
const ADEQUATE_PARKING_SPACES: u32 = 2;

/// Parse a displayed price label into a (min, max) pair of whole dollars.
///
/// A single price fills both ends; a label with no dollar amount, like
/// "Contact Agent", leaves both unset. The label itself is always kept
/// verbatim on the record.
pub fn parse_price_range(label: &str) -> (Option<u64>, Option<u64>) {
    let Some(caps) = PRICE_RANGE.captures(label) else {
        return (None, None);
    };
    let min = caps.get(1).and_then(|m| parse_dollars(m.as_str()));
    let max = caps.get(2).and_then(|m| parse_dollars(m.as_str())).or(min);
    match (min, max) {
        // Keep min <= max even when a label lists the range backwards.
        (Some(a), Some(b)) if b < a => (max, min),
        _ => (min, max),
    }
}

fn parse_dollars(text: &str) -> Option<u64> {
    text.replace(',', "").parse().ok()
}

/// Address decomposed on commas; empty strings mean the part was not found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressParts {
    pub street: String,
    pub suburb: String,
    pub state: String,
    pub postcode: String,
}

/// Split an Australian display address into street, suburb, state and
/// postcode.
///
/// The last comma segment normally carries "<suburb> <STATE> <postcode>";
/// the matched tail is stripped off the suburb. When no tail matches, the
/// segment is taken as the suburb and state and postcode stay empty for the
/// validation gate to flag.
pub fn decompose_address(text: &str) -> AddressParts {
    let mut parts = AddressParts::default();
    let segments: Vec<&str> = text
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let Some((&tail, head)) = segments.split_last() else {
        return parts;
    };
    let mut head: Vec<&str> = head.to_vec();

    let mut suburb = tail.to_string();
    if let Some(caps) = STATE_POSTCODE_TAIL.captures(tail) {
        if let (Some(whole), Some(state), Some(postcode)) = (caps.get(0), caps.get(1), caps.get(2))
        {
            parts.state = state.as_str().to_uppercase();
            parts.postcode = postcode.as_str().to_string();
            suburb = tail[..whole.start()].trim().to_string();
        }
    }
    // "…, Angle Vale, SA 5117" puts the state in its own segment; the suburb
    // is then the segment before it.
    if suburb.is_empty() {
        if let Some(previous) = head.pop() {
            suburb = previous.to_string();
        }
    }

    parts.suburb = suburb;
    parts.street = head.join(", ");
    parts
}

/// Classify the dwelling from the listed property type, falling back to the
/// address text when the portal did not state one.
pub fn classify_property_type(type_text: Option<&str>, address: &str) -> PropertyType {
    let text = match type_text {
        Some(t) if !t.trim().is_empty() => t.to_lowercase(),
        _ => address.to_lowercase(),
    };
    if text.contains("apartment") || text.contains("unit") {
        PropertyType::Apartment
    } else if text.contains("townhouse") {
        PropertyType::Townhouse
    } else if text.contains("villa") {
        PropertyType::Villa
    } else if text.contains("land") {
        PropertyType::Land
    } else {
        PropertyType::House
    }
}

/// Derive a stable listing id from the URL.
///
/// Site-specific patterns are tried first, then any run of six or more
/// digits. As a last resort the whole URL is percent-encoded, so the id is
/// always present and deterministic for a given URL.
pub fn derive_listing_id(source: ListingSource, url: &str) -> String {
    let site_specific = match source {
        ListingSource::RealEstateAu => capture_first(&REALESTATE_ID, url),
        ListingSource::DomainAu => capture_first(&DOMAIN_ID, url),
    };
    if let Some(id) = site_specific {
        return id;
    }
    if let Some(id) = capture_first(&GENERIC_ID, url) {
        return id;
    }
    form_urlencoded::byte_serialize(url.as_bytes()).collect()
}

fn capture_first(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse a listed date in any of the formats the portals render.
pub fn parse_listing_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

fn derive_adequate_parking(parking: Option<u32>) -> TriState {
    match parking {
        Some(count) => TriState::known(count >= ADEQUATE_PARKING_SPACES),
        None => TriState::Unknown,
    }
}

fn build_agent(raw: &RawExtraction) -> Option<AgentContact> {
    let agent = AgentContact {
        name: raw.agent_name.clone(),
        agency: raw.agent_agency.clone(),
        phone: raw.agent_phone.clone(),
        email: raw.agent_email.clone(),
    };
    if agent.is_empty() {
        None
    } else {
        Some(agent)
    }
}

/// Every gate failure for an extraction, in a fixed order. Empty means the
/// record is acceptable.
pub fn validation_problems(parts: &AddressParts, raw: &RawExtraction) -> Vec<String> {
    let mut problems = Vec::new();
    if parts.street.is_empty() {
        problems.push("street address is missing".to_string());
    }
    if parts.suburb.is_empty() {
        problems.push("suburb could not be determined from the address".to_string());
    }
    if parts.state.is_empty() {
        problems.push("state could not be determined from the address".to_string());
    }
    if parts.postcode.is_empty() {
        problems.push("postcode could not be determined from the address".to_string());
    }
    if raw
        .price_display
        .as_deref()
        .map_or(true, |p| p.trim().is_empty())
    {
        problems.push("price label is missing".to_string());
    }
    if raw.bedrooms.is_none() {
        problems.push("bedroom count is missing".to_string());
    }
    if raw.bathrooms.is_none() {
        problems.push("bathroom count is missing".to_string());
    }
    if raw.parking.is_none() {
        problems.push("car space count is missing".to_string());
    }
    problems
}

/// Turn a raw extraction into a validated canonical record.
///
/// The gate runs first and reports every problem in a single error rather
/// than failing on the first one. Flood, traffic and power-line exposure
/// never show up in listing copy, so those flags stay `Unknown` here; the
/// rule engine judges them from location evidence instead.
pub fn normalize_listing(
    source: ListingSource,
    url: &str,
    raw: RawExtraction,
) -> Result<CanonicalProperty, ScrapeError> {
    let parts = decompose_address(raw.address.as_deref().unwrap_or(""));
    let problems = validation_problems(&parts, &raw);
    if !problems.is_empty() {
        warn!("rejecting {}: {}", url, problems.join("; "));
        return Err(ScrapeError::validation(url, problems));
    }

    // Snapshot the extraction before fields start moving out of it.
    let raw_data = serde_json::to_value(&raw).unwrap_or(serde_json::Value::Null);

    let price_display = raw.price_display.clone().unwrap_or_default();
    let (price_min, price_max) = parse_price_range(&price_display);
    let property_type = classify_property_type(
        raw.property_type.as_deref(),
        raw.address.as_deref().unwrap_or(""),
    );
    let listing_date = raw.listing_date.as_deref().and_then(parse_listing_date);
    let days_on_market = raw.days_on_market.or_else(|| {
        listing_date.and_then(|date| (Utc::now().date_naive() - date).num_days().try_into().ok())
    });
    let agent = build_agent(&raw);
    let flags = DealBreakerFlags {
        flood_risk: TriState::Unknown,
        multi_story: raw.multi_story,
        adequate_parking: derive_adequate_parking(raw.parking),
        solar_panels: raw.solar_panels,
        pet_friendly_yard: raw.pet_friendly_yard,
        main_road: TriState::Unknown,
        power_lines: TriState::Unknown,
    };
    let images = raw
        .images
        .iter()
        .enumerate()
        .map(|(order, image)| PropertyImage {
            url: image.url.clone(),
            role: image.role,
            order: order as u32,
        })
        .collect();

    Ok(CanonicalProperty {
        listing_id: derive_listing_id(source, url),
        source,
        url: url.to_string(),
        address: parts.street,
        suburb: parts.suburb,
        state: parts.state,
        postcode: parts.postcode,
        price_display,
        price_min,
        price_max,
        bedrooms: raw.bedrooms.unwrap_or_default(),
        bathrooms: raw.bathrooms.unwrap_or_default(),
        parking: raw.parking.unwrap_or_default(),
        living_areas: raw.living_areas,
        land_size_sqm: raw.land_size_sqm,
        property_type,
        description: raw.description.unwrap_or_default(),
        features: raw.features,
        images,
        agent,
        flags,
        listing_date,
        days_on_market,
        scraped_at: Utc::now(),
        raw_data,
    })
}
