use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{CanonicalProperty, FloodRiskLevel, SuburbRiskContext};

pub const MAX_BUDGET: u64 = 900_000;
/// Warn once the effective price passes this share of the budget.
pub const BUDGET_WARNING_PERCENT: u64 = 90;
pub const MIN_BATHROOMS: u32 = 2;
pub const MIN_LIVING_AREAS: u32 = 2;
pub const MIN_CAR_SPACES: u32 = 2;
/// Blocks at or under this size cannot promise a usable yard for pets.
pub const PET_FRIENDLY_MIN_LAND_SQM: u32 = 300;

/// Northern Adelaide localities with documented flood history.
const FLOOD_PRONE_AREAS: &[&str] = &[
    "angle vale",
    "gawler",
    "gawler river",
    "virginia",
    "two wells",
    "lewiston",
    "waterloo corner",
];

const WATERWAY_KEYWORDS: &[&str] = &["river", "creek", "wetland", "floodplain"];

/// Arterial roads around the search area with constant heavy traffic.
const ARTERIAL_ROADS: &[&str] = &[
    "main north road",
    "port wakefield road",
    "heaslip road",
    "curtis road",
    "womma road",
    "angle vale road",
];

/// How serious a rule violation is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "HIGH"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::Low => write!(f, "LOW"),
        }
    }
}

/// The rule a violation or warning came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Budget,
    MultiStory,
    Bathrooms,
    LivingAreas,
    CarSpaces,
    SolarPanels,
    FloodRisk,
    PetFriendly,
    HeavyTraffic,
    PowerLines,
}

/// A requirement the property fails. Only `auto_reject` violations sink the
/// verdict; the rest are recorded for the buyer to weigh up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Violation {
    pub rule: RuleKind,
    pub severity: Severity,
    pub auto_reject: bool,
    pub message: String,
    pub detail: Option<String>,
}

/// A concern worth a look that never affects the pass/fail outcome.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Warning {
    pub rule: RuleKind,
    pub message: String,
    pub detail: Option<String>,
}

/// Outcome of evaluating one property against the household policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DealBreakerVerdict {
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
    pub passed: bool,
    pub recommendation: String,
}

impl DealBreakerVerdict {
    /// Plain-text report for terminal output and saved summaries.
    pub fn format_report(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Verdict: {}\n",
            if self.passed { "PASS" } else { "FAIL" }
        ));
        out.push_str(&format!("Recommendation: {}\n", self.recommendation));
        if !self.violations.is_empty() {
            out.push_str("\nViolations:\n");
            for violation in &self.violations {
                out.push_str(&format!("- [{}] {}", violation.severity, violation.message));
                if violation.auto_reject {
                    out.push_str(" (deal-breaker)");
                }
                if let Some(detail) = &violation.detail {
                    out.push_str(&format!(": {}", detail));
                }
                out.push('\n');
            }
        }
        if !self.warnings.is_empty() {
            out.push_str("\nWarnings:\n");
            for warning in &self.warnings {
                out.push_str(&format!("- {}", warning.message));
                if let Some(detail) = &warning.detail {
                    out.push_str(&format!(": {}", detail));
                }
                out.push('\n');
            }
        }
        out
    }
}

/// What the household requires of a property.
///
/// Defaults encode the current search brief; toggles switch individual
/// checks off entirely.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HouseholdPolicy {
    pub max_budget: u64,
    pub min_bathrooms: u32,
    pub min_living_areas: u32,
    pub min_car_spaces: u32,
    pub require_single_story: bool,
    pub require_solar: bool,
    pub require_pet_friendly_yard: bool,
    pub avoid_flood_zones: bool,
    pub avoid_heavy_traffic: bool,
    pub avoid_power_lines: bool,
}

impl Default for HouseholdPolicy {
    fn default() -> Self {
        Self {
            max_budget: MAX_BUDGET,
            min_bathrooms: MIN_BATHROOMS,
            min_living_areas: MIN_LIVING_AREAS,
            min_car_spaces: MIN_CAR_SPACES,
            require_single_story: true,
            require_solar: true,
            require_pet_friendly_yard: true,
            avoid_flood_zones: true,
            avoid_heavy_traffic: true,
            avoid_power_lines: true,
        }
    }
}

/// Evaluate a property against the policy.
///
/// Pure and stateless: the same inputs always produce the same verdict, and
/// checks run in a fixed order so the violation list is stable. Suburb risk
/// context is optional extra evidence for the flood check.
pub fn evaluate(
    property: &CanonicalProperty,
    policy: &HouseholdPolicy,
    suburb_risk: Option<&SuburbRiskContext>,
) -> DealBreakerVerdict {
    let mut violations = Vec::new();
    let mut warnings = Vec::new();

    // 1. Budget. The near-limit warning is independent of the hard cap so a
    // verdict always shows how close the price sits.
    let effective = property.effective_price();
    if effective > policy.max_budget {
        violations.push(Violation {
            rule: RuleKind::Budget,
            severity: Severity::High,
            auto_reject: true,
            message: "Price exceeds the maximum budget".to_string(),
            detail: Some(format!(
                "effective price ${} against a ${} limit",
                effective, policy.max_budget
            )),
        });
    }
    // u128 keeps the comparison exact even for prices near u64::MAX.
    let warn_threshold = u128::from(policy.max_budget) * u128::from(BUDGET_WARNING_PERCENT);
    if u128::from(effective) * 100 > warn_threshold {
        warnings.push(Warning {
            rule: RuleKind::Budget,
            message: "Price is close to the budget ceiling".to_string(),
            detail: Some(format!(
                "effective price ${} is over {}% of the ${} budget",
                effective, BUDGET_WARNING_PERCENT, policy.max_budget
            )),
        });
    }

    // 2. Storeys. Only definite evidence of a second storey counts against
    // the property; an unadvertised layout stays neutral.
    if policy.require_single_story && property.flags.multi_story.is_known_true() {
        violations.push(Violation {
            rule: RuleKind::MultiStory,
            severity: Severity::High,
            auto_reject: true,
            message: "Home has more than one storey".to_string(),
            detail: None,
        });
    }

    // 3. Bathrooms.
    if property.bathrooms < policy.min_bathrooms {
        violations.push(Violation {
            rule: RuleKind::Bathrooms,
            severity: Severity::High,
            auto_reject: true,
            message: "Not enough bathrooms".to_string(),
            detail: Some(format!(
                "{} listed, {} required",
                property.bathrooms, policy.min_bathrooms
            )),
        });
    }

    // 4. Living areas, only when the listing states a count.
    if let Some(living_areas) = property.living_areas {
        if living_areas < policy.min_living_areas {
            violations.push(Violation {
                rule: RuleKind::LivingAreas,
                severity: Severity::High,
                auto_reject: true,
                message: "Not enough living areas".to_string(),
                detail: Some(format!(
                    "{} listed, {} required",
                    living_areas, policy.min_living_areas
                )),
            });
        }
    }

    // 5. Car spaces.
    if property.parking < policy.min_car_spaces {
        violations.push(Violation {
            rule: RuleKind::CarSpaces,
            severity: Severity::Medium,
            auto_reject: true,
            message: "Not enough car spaces".to_string(),
            detail: Some(format!(
                "{} listed, {} required",
                property.parking, policy.min_car_spaces
            )),
        });
    }

    // 6. Solar. Unlike storeys, silence counts against the property here:
    // panels the listing does not mention cannot be assumed.
    if policy.require_solar && !property.flags.solar_panels.is_known_true() {
        violations.push(Violation {
            rule: RuleKind::SolarPanels,
            severity: Severity::Medium,
            auto_reject: true,
            message: "Solar panels are required but not confirmed".to_string(),
            detail: None,
        });
    }

    // 7. Flood risk, from any combination of evidence.
    if policy.avoid_flood_zones {
        let evidence = flood_evidence(property, suburb_risk);
        if !evidence.is_empty() {
            violations.push(Violation {
                rule: RuleKind::FloodRisk,
                severity: Severity::High,
                auto_reject: true,
                message: "Property is in a flood risk area".to_string(),
                detail: Some(evidence.join("; ")),
            });
        }
    }

    // 8. Pet-friendly yard. A decent block with no pet evidence gets the
    // benefit of the doubt; a small block does not.
    if policy.require_pet_friendly_yard && !property.flags.pet_friendly_yard.is_known_true() {
        let ruled_out = property.flags.pet_friendly_yard.is_known_false()
            || property.description.to_lowercase().contains("no pets");
        if ruled_out {
            violations.push(Violation {
                rule: RuleKind::PetFriendly,
                severity: Severity::Medium,
                auto_reject: false,
                message: "Listing rules out pets".to_string(),
                detail: None,
            });
        } else if let Some(size) = property.land_size_sqm {
            if size <= PET_FRIENDLY_MIN_LAND_SQM {
                violations.push(Violation {
                    rule: RuleKind::PetFriendly,
                    severity: Severity::Medium,
                    auto_reject: false,
                    message: "Yard unlikely to suit pets".to_string(),
                    detail: Some(format!("{}m² block with no word on pets", size)),
                });
            }
        }
    }

    // 9. Heavy traffic.
    if policy.avoid_heavy_traffic {
        let address = property.address.to_lowercase();
        let on_arterial = property.flags.main_road.is_known_true()
            || ARTERIAL_ROADS.iter().any(|road| address.contains(road));
        if on_arterial {
            violations.push(Violation {
                rule: RuleKind::HeavyTraffic,
                severity: Severity::Medium,
                auto_reject: false,
                message: "Property fronts a major arterial road".to_string(),
                detail: None,
            });
        }
    }

    // 10. Power lines.
    if policy.avoid_power_lines && property.flags.power_lines.is_known_true() {
        violations.push(Violation {
            rule: RuleKind::PowerLines,
            severity: Severity::Low,
            auto_reject: false,
            message: "High-voltage power lines nearby".to_string(),
            detail: None,
        });
    }

    let passed = !violations.iter().any(|v| v.auto_reject);
    let recommendation = recommendation_for(passed, &violations, &warnings);
    debug!(
        "verdict for {}: passed={} violations={} warnings={}",
        property.listing_id,
        passed,
        violations.len(),
        warnings.len()
    );

    DealBreakerVerdict {
        violations,
        warnings,
        passed,
        recommendation,
    }
}

fn flood_evidence(
    property: &CanonicalProperty,
    suburb_risk: Option<&SuburbRiskContext>,
) -> Vec<String> {
    let mut evidence = Vec::new();
    if property.flags.flood_risk.is_known_true() {
        evidence.push("the listing flags flood risk".to_string());
    }
    let suburb = property.suburb.to_lowercase();
    let address = property.address.to_lowercase();
    if FLOOD_PRONE_AREAS
        .iter()
        .any(|area| suburb.contains(area) || address.contains(area))
    {
        evidence.push("the location is a known flood-prone area".to_string());
    }
    if WATERWAY_KEYWORDS
        .iter()
        .any(|kw| address.contains(kw) || suburb.contains(kw))
    {
        evidence.push("the location names a waterway".to_string());
    }
    if let Some(level) = suburb_risk.and_then(|ctx| ctx.flood_risk(&property.suburb_key())) {
        if level >= FloodRiskLevel::Medium {
            let level_name = match level {
                FloodRiskLevel::Low => "low",
                FloodRiskLevel::Medium => "medium",
                FloodRiskLevel::High => "high",
            };
            evidence.push(format!("suburb research reports {} flood risk", level_name));
        }
    }
    evidence
}

fn recommendation_for(passed: bool, violations: &[Violation], warnings: &[Warning]) -> String {
    if passed {
        if violations.is_empty() && warnings.is_empty() {
            "Meets all requirements".to_string()
        } else {
            "Minor concerns, review the warnings".to_string()
        }
    } else if violations.iter().any(|v| v.auto_reject) {
        "Not recommended, deal-breaking issues found".to_string()
    } else {
        "Proceed with caution".to_string()
    }
}
