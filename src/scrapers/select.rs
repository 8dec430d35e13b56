use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::models::{ImageRole, TriState};
use crate::scrapers::types::RawImage;

/// Entries that mean "no value" when they show up in feature lists.
const PLACEHOLDER_ENTRIES: &[&str] = &["-", "–", "—", "n/a", "na", "tba", "..."];

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static BED_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+)\s*bed(?:room)?s?\b").unwrap());
static BATH_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+)\s*bath(?:room)?s?\b").unwrap());
static CAR_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+)\s*(?:car\s*spaces?|cars?|garages?|carports?)\b").unwrap());
static LIVING_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d+)\s*living(?:\s*(?:area|room))?s?\b").unwrap());
// The fraction must be consumed here: without it the integer part cannot
// reach the unit across the decimal point, and the match degrades to the
// fractional digits alone.
static LAND_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d[\d,]*)(?:\.\d+)?\s*(?:m²|m2\b|sqm\b|square\s*met(?:re|er)s?\b)").unwrap()
});

/// Collapse whitespace runs into single spaces.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Try selectors in order; the first non-empty text wins.
pub fn first_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    for css in selectors {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for element in doc.select(&selector) {
            let text = normalize_whitespace(&element.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// All non-empty texts from the first selector that yields any.
pub fn all_texts(doc: &Html, selectors: &[&str]) -> Vec<String> {
    for css in selectors {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        let texts: Vec<String> = doc
            .select(&selector)
            .map(|element| normalize_whitespace(&element.text().collect::<String>()))
            .filter(|text| !text.is_empty())
            .collect();
        if !texts.is_empty() {
            return texts;
        }
    }
    Vec::new()
}

/// Accumulate texts across every selector variant, in document order per
/// variant. Placeholder entries and exact duplicates are dropped.
pub fn accumulate_texts(doc: &Html, selectors: &[&str]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut texts = Vec::new();
    for css in selectors {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for element in doc.select(&selector) {
            let text = normalize_whitespace(&element.text().collect::<String>());
            if text.is_empty() || is_placeholder(&text) {
                continue;
            }
            if seen.insert(text.clone()) {
                texts.push(text);
            }
        }
    }
    texts
}

fn is_placeholder(text: &str) -> bool {
    let lowered = text.to_lowercase();
    PLACEHOLDER_ENTRIES.iter().any(|p| lowered == *p)
}

/// Strip a URI scheme like `tel:` or `mailto:` off a contact href.
pub fn strip_scheme(href: &str, scheme: &str) -> String {
    href.strip_prefix(scheme).unwrap_or(href).trim().to_string()
}

/// First attribute value across ordered (selector, attribute) pairs.
pub fn first_attr(doc: &Html, pairs: &[(&str, &str)]) -> Option<String> {
    for (css, attr) in pairs {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for element in doc.select(&selector) {
            if let Some(value) = element.value().attr(attr) {
                let value = value.trim();
                if !value.is_empty() {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// First run of digits in the text matched by the selector chain.
pub fn first_count(doc: &Html, selectors: &[&str]) -> Option<u32> {
    first_text(doc, selectors).as_deref().and_then(first_digit_run)
}

/// Parse the first run of digits in `text`. Absence is `None`, never zero.
pub fn first_digit_run(text: &str) -> Option<u32> {
    DIGIT_RUN.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Parse a land size like "450m²" or "1,012 sqm" into square metres.
pub fn parse_sqm(text: &str) -> Option<u32> {
    LAND_SIZE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

/// Counts recovered from feature and summary-strip text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureCounts {
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub parking: Option<u32>,
    pub living_areas: Option<u32>,
    pub land_size_sqm: Option<u32>,
}

/// Scan text fragments for labelled counts like "4 Beds" or "2 car spaces".
///
/// Portals render these strips with markup that plain selectors cannot pin
/// down reliably, so the numbers are recovered from the text itself. The
/// first hit per label wins.
pub fn scan_feature_counts(texts: &[String]) -> FeatureCounts {
    let mut counts = FeatureCounts::default();
    for text in texts {
        if counts.bedrooms.is_none() {
            counts.bedrooms = captured_count(&BED_COUNT, text);
        }
        if counts.bathrooms.is_none() {
            counts.bathrooms = captured_count(&BATH_COUNT, text);
        }
        if counts.parking.is_none() {
            counts.parking = captured_count(&CAR_COUNT, text);
        }
        if counts.living_areas.is_none() {
            counts.living_areas = captured_count(&LIVING_COUNT, text);
        }
        if counts.land_size_sqm.is_none() {
            counts.land_size_sqm = parse_sqm(text);
        }
    }
    counts
}

fn captured_count(re: &Regex, text: &str) -> Option<u32> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}

const FLOORPLAN_MARKERS: &[&str] = &["floorplan", "floor-plan", "floor_plan"];
const MAP_MARKERS: &[&str] = &["staticmap", "maps.google", "/map/"];
const IMAGE_PLACEHOLDER_MARKERS: &[&str] = &["placeholder", "blank.gif", "spacer"];

/// Collect image references across every selector variant, classifying each
/// by role and dropping placeholders and duplicate URLs.
pub fn collect_images(doc: &Html, selectors: &[(&str, &str)]) -> Vec<RawImage> {
    let mut seen = HashSet::new();
    let mut images = Vec::new();
    for (css, attr) in selectors {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for element in doc.select(&selector) {
            let Some(src) = element.value().attr(attr) else {
                continue;
            };
            let src = src.trim();
            if src.is_empty() || src.starts_with("data:") || is_image_placeholder(src) {
                continue;
            }
            if !seen.insert(src.to_string()) {
                continue;
            }
            let alt = element.value().attr("alt").unwrap_or("");
            images.push(RawImage {
                url: src.to_string(),
                role: classify_image(src, alt),
            });
        }
    }
    images
}

fn is_image_placeholder(src: &str) -> bool {
    let lowered = src.to_lowercase();
    IMAGE_PLACEHOLDER_MARKERS.iter().any(|m| lowered.contains(m))
}

fn classify_image(url: &str, alt: &str) -> ImageRole {
    let haystack = format!("{} {}", url.to_lowercase(), alt.to_lowercase());
    if FLOORPLAN_MARKERS.iter().any(|m| haystack.contains(m)) {
        ImageRole::Floorplan
    } else if MAP_MARKERS.iter().any(|m| haystack.contains(m)) {
        ImageRole::Map
    } else {
        ImageRole::Photo
    }
}

const SOLAR_KEYWORDS: &[&str] = &[
    "solar panel",
    "solar power",
    "solar system",
    "solar hot water",
    "photovoltaic",
];
const MULTI_STORY_KEYWORDS: &[&str] = &[
    "two storey",
    "two story",
    "double storey",
    "double story",
    "2 storey",
    "2 story",
    "second floor",
    "upstairs",
    "multi-level",
    "two level",
];
const SINGLE_STORY_KEYWORDS: &[&str] = &[
    "single storey",
    "single story",
    "single level",
    "single-level",
    "one level",
];
// Negative markers are tested first: "no pets allowed" contains "pets allowed".
const PET_NEGATIVE_KEYWORDS: &[&str] = &["no pets", "pets not allowed", "no dogs"];
const PET_POSITIVE_KEYWORDS: &[&str] = &[
    "pet friendly",
    "pet-friendly",
    "pets allowed",
    "pets welcome",
    "fully fenced",
];

/// Tri-state hints inferred from listing text, never ground truth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagHints {
    pub multi_story: TriState,
    pub solar_panels: TriState,
    pub pet_friendly_yard: TriState,
}

/// Infer flag hints from the lower-cased description and feature text.
pub fn infer_flag_hints(description: Option<&str>, features: &[String]) -> FlagHints {
    let mut text = description.unwrap_or("").to_lowercase();
    for feature in features {
        text.push(' ');
        text.push_str(&feature.to_lowercase());
    }

    let multi_story = if contains_any(&text, MULTI_STORY_KEYWORDS) {
        TriState::KnownTrue
    } else if contains_any(&text, SINGLE_STORY_KEYWORDS) {
        TriState::KnownFalse
    } else {
        TriState::Unknown
    };

    // Solar can only be proven present; a listing never advertises its absence.
    let solar_panels = if contains_any(&text, SOLAR_KEYWORDS) {
        TriState::KnownTrue
    } else {
        TriState::Unknown
    };

    let pet_friendly_yard = if contains_any(&text, PET_NEGATIVE_KEYWORDS) {
        TriState::KnownFalse
    } else if contains_any(&text, PET_POSITIVE_KEYWORDS) {
        TriState::KnownTrue
    } else {
        TriState::Unknown
    };

    FlagHints {
        multi_story,
        solar_panels,
        pet_friendly_yard,
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <html>
        <body>
            <h1 class="headline">  4 Irwin   Court  </h1>
            <div class="fallback-headline">Should not win</div>
            <span class="empty"></span>
            <ul class="features">
                <li>Ducted air conditioning</li>
                <li>-</li>
                <li>Solar panels</li>
                <li>Ducted air conditioning</li>
            </ul>
            <ul class="extras">
                <li>Garden shed</li>
            </ul>
            <div class="summary">
                <span>4 Beds</span>
                <span>2 Baths</span>
                <span>2 Car Spaces</span>
                <span>1,012m² land</span>
            </div>
            <img src="https://img.example.com/photo-1.jpg" alt="Front of house">
            <img src="https://img.example.com/photo-1.jpg" alt="Duplicate">
            <img src="https://img.example.com/floorplan-1.gif" alt="Floorplan">
            <img src="data:image/gif;base64,xyz" alt="Inline">
        </body>
        </html>
    "#;

    fn doc() -> Html {
        Html::parse_document(SAMPLE_HTML)
    }

    #[test]
    fn first_text_takes_the_first_non_empty_selector() {
        let doc = doc();
        let text = first_text(&doc, &["span.empty", "h1.headline", "div.fallback-headline"]);
        assert_eq!(text.as_deref(), Some("4 Irwin Court"));
    }

    #[test]
    fn first_text_returns_none_when_nothing_matches() {
        let doc = doc();
        assert_eq!(first_text(&doc, &["article", "section.none"]), None);
    }

    #[test]
    fn accumulate_texts_spans_variants_and_filters_placeholders() {
        let doc = doc();
        let texts = accumulate_texts(&doc, &["ul.features li", "ul.extras li"]);
        assert_eq!(
            texts,
            vec![
                "Ducted air conditioning".to_string(),
                "Solar panels".to_string(),
                "Garden shed".to_string(),
            ]
        );
    }

    #[test]
    fn digit_runs_parse_or_stay_absent() {
        assert_eq!(first_digit_run("4 Beds"), Some(4));
        assert_eq!(first_digit_run("Beds"), None);
        assert_eq!(first_digit_run(""), None);
    }

    #[test]
    fn scans_labelled_counts_from_summary_text() {
        let texts = vec![
            "4 Beds".to_string(),
            "2 Baths".to_string(),
            "2 Car Spaces".to_string(),
            "1,012m² land".to_string(),
        ];
        let counts = scan_feature_counts(&texts);
        assert_eq!(counts.bedrooms, Some(4));
        assert_eq!(counts.bathrooms, Some(2));
        assert_eq!(counts.parking, Some(2));
        assert_eq!(counts.land_size_sqm, Some(1012));
        assert_eq!(counts.living_areas, None);
    }

    #[test]
    fn scan_handles_combined_strips() {
        let texts = vec!["4 bed 2 bath 2 car house with 2 living areas".to_string()];
        let counts = scan_feature_counts(&texts);
        assert_eq!(counts.bedrooms, Some(4));
        assert_eq!(counts.bathrooms, Some(2));
        assert_eq!(counts.parking, Some(2));
        assert_eq!(counts.living_areas, Some(2));
    }

    #[test]
    fn parse_sqm_requires_a_unit() {
        assert_eq!(parse_sqm("450m²"), Some(450));
        assert_eq!(parse_sqm("1,012 sqm"), Some(1012));
        assert_eq!(parse_sqm("450"), None);
    }

    #[test]
    fn decimal_land_sizes_keep_the_whole_metres() {
        assert_eq!(parse_sqm("592.9m²"), Some(592));
        assert_eq!(parse_sqm("Land size 592.9m²"), Some(592));
        assert_eq!(parse_sqm("450.25 sqm"), Some(450));
    }

    #[test]
    fn images_are_classified_and_deduplicated() {
        let doc = doc();
        let images = collect_images(&doc, &[("img", "src")]);
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].url, "https://img.example.com/photo-1.jpg");
        assert_eq!(images[0].role, ImageRole::Photo);
        assert_eq!(images[1].role, ImageRole::Floorplan);
    }

    #[test]
    fn flag_hints_detect_solar_and_storeys() {
        let hints = infer_flag_hints(
            Some("A neat single storey home with solar panels."),
            &["Fully fenced yard".to_string()],
        );
        assert!(hints.solar_panels.is_known_true());
        assert!(hints.multi_story.is_known_false());
        assert!(hints.pet_friendly_yard.is_known_true());
    }

    #[test]
    fn negative_pet_markers_beat_positive_ones() {
        let hints = infer_flag_hints(Some("Strictly no pets allowed."), &[]);
        assert!(hints.pet_friendly_yard.is_known_false());
    }

    #[test]
    fn absent_evidence_stays_unknown() {
        let hints = infer_flag_hints(Some("A lovely home."), &[]);
        assert!(hints.multi_story.is_unknown());
        assert!(hints.solar_panels.is_unknown());
        assert!(hints.pet_friendly_yard.is_unknown());
    }
}
