use property_scout::{evaluate, scrape_listing, ChromeFetcher, FetchOptions, HouseholdPolicy};
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("🏠 Property Scout - Listing Evaluator");
    info!("=====================================");

    let url = match std::env::args().nth(1) {
        Some(url) => url,
        None => anyhow::bail!("Usage: property-scout <listing-url>"),
    };

    let fetcher = ChromeFetcher::new(FetchOptions::default());
    let property = scrape_listing(&url, &fetcher).await?;

    info!(
        "✅ Scraped: {}, {} {} {}",
        property.address, property.suburb, property.state, property.postcode
    );
    info!(
        "   {} bed / {} bath / {} car, listed at {}",
        property.bedrooms, property.bathrooms, property.parking, property.price_display
    );

    let verdict = evaluate(&property, &HouseholdPolicy::default(), None);
    println!("{}", verdict.format_report());

    // Keep the full record for later comparison runs
    let filename = format!("scraped_{}.json", property.listing_id);
    let json = serde_json::to_string_pretty(&property)?;
    tokio::fs::write(&filename, json).await?;
    info!("💾 Saved property record to {}", filename);

    Ok(())
}
