use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use property_scout::{
    evaluate, scrape_listing, HouseholdPolicy, ListingSource, PageFetcher, RenderedPage,
    RuleKind, ScrapeError,
};

/// Serves a fixed page body and counts how often it is asked to fetch.
struct CannedFetcher {
    html: &'static str,
    calls: AtomicUsize,
}

impl CannedFetcher {
    fn new(html: &'static str) -> Self {
        Self {
            html,
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for CannedFetcher {
    async fn fetch(&self, url: &str) -> Result<RenderedPage, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(RenderedPage::new(url, self.html))
    }
}

const REALESTATE_URL: &str = "https://www.realestate.com.au/property-house-sa-angle+vale-144523456";

const REALESTATE_HTML: &str = r#"
    <!DOCTYPE html>
    <html>
    <body>
        <div class="property-info">
            <h1 class="property-info-address">12 River Bend Drive, Angle Vale SA 5117</h1>
            <span class="property-price">$680,000 - $720,000</span>
            <span data-testid="listing-summary-property-type">House</span>
            <ul class="property-info__primary-features">
                <li>4 Beds</li>
                <li>2 Baths</li>
                <li>2 Car Spaces</li>
            </ul>
            <span data-testid="property-size">650m²</span>
        </div>
        <div data-testid="property-features">
            <ul>
                <li>Solar panels</li>
                <li>2 Living Areas</li>
                <li>Fully fenced yard</li>
            </ul>
        </div>
        <div data-testid="listing-details__description">
            <p>A tidy single storey family home backing onto the river reserve.</p>
        </div>
        <div class="property-gallery">
            <img src="https://i2.au.reastatic.net/800x600/abc/front.jpg" alt="Front">
            <img src="https://i2.au.reastatic.net/800x600/abc/living.jpg" alt="Living">
            <img src="https://i2.au.reastatic.net/800x600/abc/floorplan.gif" alt="Floorplan">
        </div>
    </body>
    </html>
"#;

const DOMAIN_URL: &str =
    "https://www.domain.com.au/18-quiet-court-salisbury-heights-sa-5109-2019284256";

const DOMAIN_HTML: &str = r#"
    <!DOCTYPE html>
    <html>
    <body>
        <div data-testid="listing-details__button-copy-wrapper">
            <h1>18 Quiet Court, Salisbury Heights SA 5109</h1>
        </div>
        <div data-testid="listing-details__summary-title">$750,000</div>
        <span data-testid="listing-summary-property-type">House</span>
        <div data-testid="property-features-text-container">4 Beds</div>
        <div data-testid="property-features-text-container">2 Baths</div>
        <div data-testid="property-features-text-container">2 Cars</div>
        <span data-testid="listing-details__land-size">450m²</span>
        <div data-testid="listing-details__description">
            <p>Immaculate single storey home with solar panels, two living
            zones and a fully fenced yard where pets are welcome.</p>
        </div>
        <div data-testid="listing-details__additional-features">
            <ul>
                <li>Solar panels</li>
                <li>2 Living Areas</li>
                <li>Fully fenced yard</li>
            </ul>
        </div>
    </body>
    </html>
"#;

const MISSING_POSTCODE_HTML: &str = r#"
    <html>
    <body>
        <h1 class="property-info-address">12 Example Street, Craigmore</h1>
        <span class="property-price">$600,000</span>
        <ul class="property-info__primary-features">
            <li>3 Beds</li>
            <li>2 Baths</li>
            <li>2 Car Spaces</li>
        </ul>
    </body>
    </html>
"#;

#[tokio::test]
async fn realestate_listing_scrapes_to_a_canonical_record() {
    let fetcher = CannedFetcher::new(REALESTATE_HTML);
    let property = scrape_listing(REALESTATE_URL, &fetcher)
        .await
        .expect("scrape should succeed");

    assert_eq!(fetcher.call_count(), 1);
    assert_eq!(property.source, ListingSource::RealEstateAu);
    assert_eq!(property.listing_id, "144523456");
    assert_eq!(property.address, "12 River Bend Drive");
    assert_eq!(property.suburb, "Angle Vale");
    assert_eq!(property.state, "SA");
    assert_eq!(property.postcode, "5117");
    assert_eq!(property.price_min, Some(680_000));
    assert_eq!(property.price_max, Some(720_000));
    assert_eq!(property.price_display, "$680,000 - $720,000");
    assert_eq!(property.bedrooms, 4);
    assert_eq!(property.bathrooms, 2);
    assert_eq!(property.parking, 2);
    assert_eq!(property.living_areas, Some(2));
    assert_eq!(property.land_size_sqm, Some(650));

    let orders: Vec<u32> = property.images.iter().map(|i| i.order).collect();
    assert_eq!(orders, vec![0, 1, 2]);
}

#[tokio::test]
async fn angle_vale_listing_fails_on_flood_risk() {
    let fetcher = CannedFetcher::new(REALESTATE_HTML);
    let property = scrape_listing(REALESTATE_URL, &fetcher)
        .await
        .expect("scrape should succeed");

    let verdict = evaluate(&property, &HouseholdPolicy::default(), None);
    assert!(!verdict.passed);
    assert_eq!(verdict.violations.len(), 1);
    assert_eq!(verdict.violations[0].rule, RuleKind::FloodRisk);
    assert_eq!(
        verdict.recommendation,
        "Not recommended, deal-breaking issues found"
    );
}

#[tokio::test]
async fn domain_listing_passes_every_check() {
    let fetcher = CannedFetcher::new(DOMAIN_HTML);
    let property = scrape_listing(DOMAIN_URL, &fetcher)
        .await
        .expect("scrape should succeed");

    assert_eq!(property.source, ListingSource::DomainAu);
    assert_eq!(property.listing_id, "2019284256");
    assert_eq!(property.suburb, "Salisbury Heights");
    assert_eq!(property.price_min, Some(750_000));
    assert_eq!(property.price_max, Some(750_000));

    let verdict = evaluate(&property, &HouseholdPolicy::default(), None);
    assert!(verdict.passed);
    assert!(verdict.violations.is_empty());
    assert!(verdict.warnings.is_empty());
    assert_eq!(verdict.recommendation, "Meets all requirements");
}

#[tokio::test]
async fn unknown_source_is_rejected_without_a_fetch() {
    let fetcher = CannedFetcher::new(REALESTATE_HTML);
    let err = scrape_listing("https://www.zillow.com/homedetails/123", &fetcher)
        .await
        .expect_err("unsupported portal must be rejected");

    assert!(err.is_validation());
    assert!(err.to_string().contains("unsupported listing source"));
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn listing_without_a_postcode_fails_validation() {
    let fetcher = CannedFetcher::new(MISSING_POSTCODE_HTML);
    let err = scrape_listing(
        "https://www.realestate.com.au/property-house-sa-craigmore-100200300",
        &fetcher,
    )
    .await
    .expect_err("missing postcode must fail the gate");

    assert!(err.is_validation());
    assert!(err.to_string().contains("postcode"));
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn blank_page_is_an_extraction_error() {
    let fetcher = CannedFetcher::new("");
    let err = scrape_listing(REALESTATE_URL, &fetcher)
        .await
        .expect_err("blank page must fail extraction");

    assert!(err.is_extraction());
    assert!(err.to_string().starts_with("realestate-extraction"));
}
