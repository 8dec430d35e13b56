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

/// Field extractor for domain.com.au listing pages.
///
/// Domain tags most of its markup with `data-testid` attributes, which are
/// steadier than class names; class-based fallbacks cover older templates.
pub struct DomainAuExtractor;

const ADDRESS_SELECTORS: &[&str] = &[
    "[data-testid='listing-details__button-copy-wrapper'] h1",
    "h1[class*='address']",
    ".listing-details__listing-summary-address",
];

const PRICE_SELECTORS: &[&str] = &[
    "[data-testid='listing-details__summary-title']",
    ".listing-details__listing-summary-title",
    "[class*='price-wrapper']",
];

const BED_SELECTORS: &[&str] = &["[data-testid='property-features-beds']"];
const BATH_SELECTORS: &[&str] = &["[data-testid='property-features-baths']"];
const PARKING_SELECTORS: &[&str] = &["[data-testid='property-features-parking']"];

const SUMMARY_SELECTORS: &[&str] = &[
    "[data-testid='property-features-text-container']",
    ".listing-details__listing-summary-features span",
];

const FEATURE_SELECTORS: &[&str] = &[
    "[data-testid='listing-details__additional-features'] li",
    ".listing-details__additional-features-listing li",
    "ul[class*='features'] li",
];

const DESCRIPTION_SELECTORS: &[&str] = &[
    "[data-testid='listing-details__description'] p",
    ".listing-details__description p",
];

const LAND_SELECTORS: &[&str] = &[
    "[data-testid='listing-details__land-size']",
    ".listing-details__land-size",
];

const TYPE_SELECTORS: &[&str] = &[
    "[data-testid='listing-summary-property-type']",
    ".listing-details__property-type",
];

const IMAGE_SELECTORS: &[(&str, &str)] = &[
    ("[data-testid='gallery'] img", "src"),
    (".listing-details__gallery img", "src"),
    ("picture img", "src"),
];

const AGENT_NAME_SELECTORS: &[&str] = &[
    "[data-testid='listing-details__agent-name']",
    ".agent-details__name",
];
const AGENCY_SELECTORS: &[&str] = &[
    "[data-testid='listing-details__agency-name']",
    ".agent-details__agency",
];

const DATE_SELECTORS: &[&str] = &["[data-testid='listing-details__listed-date']"];

impl SiteExtractor for DomainAuExtractor {
    fn source(&self) -> ListingSource {
        ListingSource::DomainAu
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
            "domain extraction: address={:?} price={:?} beds={:?}",
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
            days_on_market: None,
            multi_story: hints.multi_story,
            solar_panels: hints.solar_panels,
            pet_friendly_yard: hints.pet_friendly_yard,
        })
    }
}
