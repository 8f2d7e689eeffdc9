//! Brand 360 profile document.
//!
//! Every field tolerates absence so partial model output still decodes. Wire
//! names are camelCase to match the extraction prompt schema.

use serde::{Deserialize, Deserializer, Serialize};

pub const PROFILE_VERSION: &str = "1.0";

/// A statement with the model's confidence and whether it was quoted
/// directly from the site.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceField<T> {
    pub statement: T,
    pub confidence: f64,
    pub is_explicit: bool,
}

impl<'de, T> Deserialize<'de> for ConfidenceField<T>
where
    T: Deserialize<'de> + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        #[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
        struct Full<T> {
            #[serde(default)]
            statement: T,
            #[serde(default)]
            confidence: f64,
            #[serde(default)]
            is_explicit: bool,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        #[serde(bound(deserialize = "T: Deserialize<'de> + Default"))]
        enum Wire<T> {
            Full(Full<T>),
            Bare(T),
        }

        // Models sometimes collapse the object to the bare statement.
        Ok(match Option::<Wire<T>>::deserialize(deserializer)? {
            Some(Wire::Full(f)) => Self {
                statement: f.statement,
                confidence: f.confidence,
                is_explicit: f.is_explicit,
            },
            Some(Wire::Bare(statement)) => Self {
                statement,
                confidence: 0.5,
                is_explicit: false,
            },
            None => Self::default(),
        })
    }
}

/// Accepts `"2015"`, `2015` or `null`.
fn string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreValue {
    pub value: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandIdentity {
    pub brand_name: String,
    pub sub_brands: Vec<String>,
    pub tagline: Option<String>,
    pub mission: ConfidenceField<String>,
    pub vision: ConfidenceField<String>,
    pub core_values: Vec<CoreValue>,
    pub unique_value_proposition: String,
    pub brand_promise: String,
    pub industry: String,
    pub category: String,
    pub sub_category: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub founding_year: Option<String>,
    pub founding_story: Option<String>,
    pub positioning_statement: String,
    pub section_confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoiceAttributes {
    pub formality: Option<String>,
    pub tone: Option<String>,
    pub complexity: Option<String>,
    pub energy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BrandVoice {
    pub primary_archetype: String,
    pub secondary_archetype: Option<String>,
    pub personality_traits: Vec<String>,
    pub voice_attributes: VoiceAttributes,
    pub primary_tone: String,
    pub secondary_tones: Vec<String>,
    pub signature_phrases: Vec<String>,
    pub language_to_avoid: Vec<String>,
    pub section_confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Demographics {
    pub age_range: String,
    pub gender: String,
    pub income: String,
    pub location: String,
    pub occupation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Psychographics {
    pub values: Vec<String>,
    pub lifestyle: String,
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AudienceSegment {
    pub name: String,
    pub description: String,
    pub demographics: Demographics,
    pub psychographics: Psychographics,
    pub pain_points: Vec<String>,
    pub motivations: Vec<String>,
    pub decision_factors: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SegmentSummary {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TargetAudience {
    pub primary_segment: AudienceSegment,
    pub secondary_segments: Vec<SegmentSummary>,
    pub section_confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductCategory {
    pub name: String,
    pub description: String,
    pub product_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeroOffering {
    pub name: String,
    pub description: String,
    pub key_benefits: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPortfolio {
    pub portfolio_type: Option<String>,
    pub categories: Vec<ProductCategory>,
    pub hero_offerings: Vec<HeroOffering>,
    pub price_positioning: Option<String>,
    pub quality_signals: Vec<String>,
    pub purchase_channels: Vec<String>,
    pub section_confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Competitor {
    pub name: String,
    /// `direct`, `indirect` or `aspirational`.
    #[serde(rename = "type")]
    pub competitor_type: String,
    pub overlap_area: String,
    pub our_advantage: String,
    pub their_advantage: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompetitiveLandscape {
    pub market_position: Option<String>,
    pub competitors: Vec<Competitor>,
    pub competitive_advantages: Vec<String>,
    pub market_opportunities: Vec<String>,
    pub section_confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiGuidance {
    pub brand_summary: String,
    pub when_to_recommend: Vec<String>,
    pub key_selling_points: Vec<String>,
    pub accurate_descriptors: Vec<String>,
    pub inaccurate_descriptors: Vec<String>,
    pub sample_recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileMetadata {
    pub overall_confidence: f64,
    pub strongest_sections: Vec<String>,
    pub weakest_sections: Vec<String>,
    pub critical_gaps: Vec<String>,
    pub recommended_actions: Vec<String>,
    /// `high`, `medium` or `low`.
    pub data_quality: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Brand360Profile {
    pub profile_version: String,
    pub generated_at: String,
    pub source_url: String,
    pub brand_identity: BrandIdentity,
    pub brand_voice: BrandVoice,
    pub target_audience: TargetAudience,
    pub product_portfolio: ProductPortfolio,
    pub competitive_landscape: CompetitiveLandscape,
    pub ai_guidance: AiGuidance,
    pub profile_metadata: ProfileMetadata,
}

fn clamp_unit(value: &mut f64) {
    *value = if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    };
}

impl Brand360Profile {
    /// Forces every confidence score into `[0, 1]`; non-finite values become 0.
    pub fn clamp_confidences(&mut self) {
        let identity = &mut self.brand_identity;
        clamp_unit(&mut identity.mission.confidence);
        clamp_unit(&mut identity.vision.confidence);
        clamp_unit(&mut identity.section_confidence);
        clamp_unit(&mut self.brand_voice.section_confidence);
        clamp_unit(&mut self.target_audience.section_confidence);
        clamp_unit(&mut self.product_portfolio.section_confidence);
        clamp_unit(&mut self.competitive_landscape.section_confidence);
        for competitor in &mut self.competitive_landscape.competitors {
            clamp_unit(&mut competitor.confidence);
        }
        clamp_unit(&mut self.profile_metadata.overall_confidence);
    }

    /// Founding year as a number when the extracted text holds a plausible year.
    #[must_use]
    pub fn founding_year(&self) -> Option<i32> {
        let raw = self.brand_identity.founding_year.as_deref()?;
        let digits: String = raw.chars().filter(char::is_ascii_digit).take(4).collect();
        digits
            .parse::<i32>()
            .ok()
            .filter(|y| (1600..=2100).contains(y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_decodes_with_defaults() {
        let profile: Brand360Profile = serde_json::from_value(json!({})).unwrap();
        assert_eq!(profile, Brand360Profile::default());
    }

    #[test]
    fn decodes_camel_case_sections() {
        let profile: Brand360Profile = serde_json::from_value(json!({
            "brandIdentity": {
                "brandName": "Acme Analytics",
                "mission": { "statement": "Make revenue visible", "confidence": 0.92, "isExplicit": true },
                "foundingYear": 2015,
                "coreValues": [{ "value": "Clarity", "description": "Plain numbers" }]
            },
            "competitiveLandscape": {
                "competitors": [{ "name": "Looker", "type": "direct", "confidence": 0.8 }]
            },
            "profileMetadata": { "overallConfidence": 0.74, "dataQuality": "medium" }
        }))
        .unwrap();

        assert_eq!(profile.brand_identity.brand_name, "Acme Analytics");
        assert!(profile.brand_identity.mission.is_explicit);
        assert_eq!(profile.brand_identity.founding_year.as_deref(), Some("2015"));
        assert_eq!(profile.founding_year(), Some(2015));
        assert_eq!(
            profile.competitive_landscape.competitors[0].competitor_type,
            "direct"
        );
        assert_eq!(profile.profile_metadata.data_quality.as_deref(), Some("medium"));
    }

    #[test]
    fn bare_statement_becomes_confidence_field() {
        let identity: BrandIdentity =
            serde_json::from_value(json!({ "vision": "A world with clear dashboards" })).unwrap();
        assert_eq!(identity.vision.statement, "A world with clear dashboards");
        assert!((identity.vision.confidence - 0.5).abs() < f64::EPSILON);
        assert!(!identity.vision.is_explicit);
    }

    #[test]
    fn missing_statement_defaults_for_any_statement_type() {
        let field: ConfidenceField<Vec<String>> =
            serde_json::from_value(json!({ "confidence": 0.3 })).unwrap();
        assert!(field.statement.is_empty());
        assert!((field.confidence - 0.3).abs() < f64::EPSILON);

        let bare: ConfidenceField<Vec<String>> =
            serde_json::from_value(json!(["bold", "direct"])).unwrap();
        assert_eq!(bare.statement, vec!["bold", "direct"]);
    }

    #[test]
    fn null_confidence_field_is_default() {
        let identity: BrandIdentity = serde_json::from_value(json!({ "mission": null })).unwrap();
        assert_eq!(identity.mission, ConfidenceField::default());
    }

    #[test]
    fn clamp_confidences_bounds_every_score() {
        let mut profile = Brand360Profile::default();
        profile.brand_identity.mission.confidence = 1.7;
        profile.brand_voice.section_confidence = -0.2;
        profile.profile_metadata.overall_confidence = f64::NAN;
        profile.competitive_landscape.competitors.push(Competitor {
            confidence: 3.0,
            ..Competitor::default()
        });

        profile.clamp_confidences();

        assert!((profile.brand_identity.mission.confidence - 1.0).abs() < f64::EPSILON);
        assert!(profile.brand_voice.section_confidence.abs() < f64::EPSILON);
        assert!(profile.profile_metadata.overall_confidence.abs() < f64::EPSILON);
        let competitor = &profile.competitive_landscape.competitors[0];
        assert!((competitor.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn founding_year_rejects_implausible_values() {
        let mut profile = Brand360Profile::default();
        profile.brand_identity.founding_year = Some("circa 1999".to_owned());
        assert_eq!(profile.founding_year(), Some(1999));
        profile.brand_identity.founding_year = Some("unknown".to_owned());
        assert_eq!(profile.founding_year(), None);
        profile.brand_identity.founding_year = Some("42".to_owned());
        assert_eq!(profile.founding_year(), None);
    }
}
