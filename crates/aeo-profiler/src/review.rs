//! Review queue: extracted fields whose confidence is too low to trust
//! without a human look.

use serde::Serialize;
use serde_json::{json, Value};

use crate::profile::Brand360Profile;

pub const DEFAULT_REVIEW_THRESHOLD: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewItem {
    pub section: &'static str,
    pub field: String,
    pub value: Value,
    pub confidence: f64,
}

/// Lists fields below `threshold`, lowest confidence first.
///
/// Checked: mission and vision statements, each section's confidence, each
/// competitor, and the overall profile confidence. Empty statements and
/// sections that were not extracted at all are skipped.
#[must_use]
pub fn low_confidence_fields(profile: &Brand360Profile, threshold: f64) -> Vec<ReviewItem> {
    let mut items = Vec::new();
    let mut push = |section: &'static str, field: String, value: Value, confidence: f64| {
        if confidence < threshold {
            items.push(ReviewItem {
                section,
                field,
                value,
                confidence,
            });
        }
    };

    let identity = &profile.brand_identity;
    for (name, field) in [("mission", &identity.mission), ("vision", &identity.vision)] {
        if !field.statement.trim().is_empty() {
            push(
                "brandIdentity",
                name.to_owned(),
                json!(field.statement),
                field.confidence,
            );
        }
    }

    let sections: [(&'static str, f64, Value); 5] = [
        (
            "brandIdentity",
            identity.section_confidence,
            json!(identity.brand_name),
        ),
        (
            "brandVoice",
            profile.brand_voice.section_confidence,
            json!(profile.brand_voice.primary_archetype),
        ),
        (
            "targetAudience",
            profile.target_audience.section_confidence,
            json!(profile.target_audience.primary_segment.name),
        ),
        (
            "productPortfolio",
            profile.product_portfolio.section_confidence,
            json!(profile
                .product_portfolio
                .hero_offerings
                .iter()
                .map(|h| h.name.as_str())
                .collect::<Vec<_>>()),
        ),
        (
            "competitiveLandscape",
            profile.competitive_landscape.section_confidence,
            json!(profile.competitive_landscape.market_position),
        ),
    ];
    for (section, confidence, value) in sections {
        if !is_blank(&value) {
            push(section, "sectionConfidence".to_owned(), value, confidence);
        }
    }

    for (i, competitor) in profile.competitive_landscape.competitors.iter().enumerate() {
        push(
            "competitiveLandscape",
            format!("competitors[{i}]"),
            json!(competitor.name),
            competitor.confidence,
        );
    }

    if !profile.brand_identity.brand_name.is_empty() {
        push(
            "profileMetadata",
            "overallConfidence".to_owned(),
            json!(profile.brand_identity.brand_name),
            profile.profile_metadata.overall_confidence,
        );
    }

    items.sort_by(|a, b| a.confidence.total_cmp(&b.confidence));
    items
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        _ => false,
    }
}
