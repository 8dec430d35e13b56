use anyhow::{bail, Result};
use scraper::Html;
use tracing::debug;

use crate::models::ListingSource;
use crate::scrapers::select::{
    accumulate_texts, all_texts, collect_images, first_attr, first_count, first_text,
    infer_flag_hints, parse_sqm, scan_feature_counts, strip_scheme,
};
use crate::scrapers::traits::{RenderedPage, SiteExtractor};
use crate::scrapers::types::RawExtraction;

/// Field extractor for realestate.com.au listing pages.
///
/// The portal reshuffles its markup between rollouts, so every field keeps
/// an ordered list of selector fallbacks; the first non-empty hit wins.
pub struct RealEstateAuExtractor;

const ADDRESS_SELECTORS: &[&str] = &[
    "h1.property-info-address",
    "[data-testid='address-label']",
    ".property-info__header h1",
];

const PRICE_SELECTORS: &[&str] = &[
    ".property-price",
    "[data-testid='listing-details__summary-title']",
    ".property-info__middle-content .price",
];

const BED_SELECTORS: &[&str] = &["[aria-label*='bedroom']", "[data-testid='beds-value']"];
const BATH_SELECTORS: &[&str] = &["[aria-label*='bathroom']", "[data-testid='baths-value']"];
const PARKING_SELECTORS: &[&str] = &["[aria-label*='car space']", "[data-testid='cars-value']"];

// Summary strips render "4 Beds / 2 Baths / 2 Car Spaces" in markup that
// changes too often to pin down; the text scan recovers the numbers.
const SUMMARY_SELECTORS: &[&str] = &[
    ".property-info__primary-features li",
    "[data-testid='property-features-text-container']",
];

const FEATURE_SELECTORS: &[&str] = &[
    "[data-testid='property-features'] li",
    ".property-features__list li",
    "ul.features li",
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    "[data-testid='listing-details__description'] p",
    ".property-description__content p",
];

const LAND_SELECTORS: &[&str] = &["[data-testid='property-size']", ".property-size__land"];

const TYPE_SELECTORS: &[&str] = &[
    "[data-testid='listing-summary-property-type']",
    ".property-info__property-type",
];

const IMAGE_SELECTORS: &[(&str, &str)] = &[
    (".property-gallery img", "src"),
    ("[data-testid='hero-image'] img", "src"),
    ("picture img", "src"),
];

const AGENT_NAME_SELECTORS: &[&str] = &["[data-testid='agent-name']", ".agent-info__name"];
const AGENCY_SELECTORS: &[&str] = &["[data-testid='agency-name']", ".agent-info__agency"];

const DATE_SELECTORS: &[&str] = &["[data-testid='listing-summary-date']"];
const DAYS_ON_MARKET_SELECTORS: &[&str] = &["[data-testid='days-on-market']"];

impl SiteExtractor for RealEstateAuExtractor {
    fn source(&self) -> ListingSource {
        ListingSource::RealEstateAu
    }

    fn extract(&self, page: &RenderedPage) -> Result<RawExtraction> {
        if page.html.trim().is_empty() {
            bail!("empty document");
        }
        let doc = Html::parse_document(&page.html);

        let address = first_text(&doc, ADDRESS_SELECTORS);
        let price_display = first_text(&doc, PRICE_SELECTORS);

        let description = {
            let paragraphs = all_texts(&doc, DESCRIPTION_SELECTORS);
            if paragraphs.is_empty() {
                None
            } else {
                Some(paragraphs.join("\n"))
            }
        };
        let features = accumulate_texts(&doc, FEATURE_SELECTORS);
        let images = collect_images(&doc, IMAGE_SELECTORS);

        let mut scan_pool = accumulate_texts(&doc, SUMMARY_SELECTORS);
        scan_pool.extend(features.iter().cloned());
        let counts = scan_feature_counts(&scan_pool);

        let bedrooms = first_count(&doc, BED_SELECTORS).or(counts.bedrooms);
        let bathrooms = first_count(&doc, BATH_SELECTORS).or(counts.bathrooms);
        let parking = first_count(&doc, PARKING_SELECTORS).or(counts.parking);
        let land_size_sqm = first_text(&doc, LAND_SELECTORS)
            .as_deref()
            .and_then(parse_sqm)
            .or(counts.land_size_sqm);

        let hints = infer_flag_hints(description.as_deref(), &features);

        debug!(
            "realestate extraction: address={:?} price={:?} beds={:?}",
            address, price_display, bedrooms
        );

        Ok(RawExtraction {
            address,
            price_display,
            bedrooms,
            bathrooms,
            parking,
            living_areas: counts.living_areas,
            land_size_sqm,
            property_type: first_text(&doc, TYPE_SELECTORS),
            description,
            features,
            images,
            agent_name: first_text(&doc, AGENT_NAME_SELECTORS),
            agent_agency: first_text(&doc, AGENCY_SELECTORS),
            agent_phone: first_attr(&doc, &[("a[href^='tel:']", "href")])
                .map(|href| strip_scheme(&href, "tel:")),
            agent_email: first_attr(&doc, &[("a[href^='mailto:']", "href")])
                .map(|href| strip_scheme(&href, "mailto:")),
            listing_date: first_text(&doc, DATE_SELECTORS),
            days_on_market: first_count(&doc, DAYS_ON_MARKET_SELECTORS),
            multi_story: hints.multi_story,
            solar_panels: hints.solar_panels,
            pet_friendly_yard: hints.pet_friendly_yard,
        })
    }
}
