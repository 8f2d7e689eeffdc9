//! Verified brand facts the judge scores responses against, and the
//! prompt-generation context derived from the same rows.

use aeo_db::{
    BrandClaimRow, BrandCompetitorRow, BrandPersonaRow, BrandProductRow, BrandProfileRow, BrandRow,
};
use aeo_prompts::{CompetitorInput, GenerationContext, PersonaInput, ProductInput};
use serde::Serialize;

const DEFAULT_TONE: &str = "professional";
const DEFAULT_VOCABULARY: &str = "moderate";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductFacts {
    pub name: String,
    pub features: Vec<String>,
    pub benefits: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VoiceProfile {
    pub primary_tone: String,
    pub vocabulary_level: String,
    pub approved_phrases: Vec<String>,
    pub banned_phrases: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroundTruth {
    pub brand_name: String,
    pub products: Vec<ProductFacts>,
    pub claims: Vec<String>,
    pub competitors: Vec<String>,
    pub founding_year: Option<i32>,
    pub founders: Vec<String>,
    pub values: Vec<String>,
    pub voice: VoiceProfile,
    pub misconceptions: Vec<String>,
    pub negative_keywords: Vec<String>,
}

/// Everything stored about a brand, loaded together.
#[derive(Debug, Clone)]
pub struct BrandKnowledge {
    pub brand: BrandRow,
    pub profile: Option<BrandProfileRow>,
    pub competitors: Vec<BrandCompetitorRow>,
    pub products: Vec<BrandProductRow>,
    pub personas: Vec<BrandPersonaRow>,
    pub claims: Vec<BrandClaimRow>,
}

impl BrandKnowledge {
    /// # Errors
    ///
    /// Returns [`aeo_db::DbError::Sqlx`] if any query fails.
    pub async fn load(pool: &sqlx::PgPool, brand: BrandRow) -> Result<Self, aeo_db::DbError> {
        let profile = aeo_db::get_brand_profile(pool, brand.id).await?;
        let competitors = aeo_db::list_brand_competitors(pool, brand.id).await?;
        let products = aeo_db::list_brand_products(pool, brand.id).await?;
        let personas = aeo_db::list_brand_personas(pool, brand.id).await?;
        let claims = aeo_db::list_brand_claims(pool, brand.id).await?;
        Ok(Self {
            brand,
            profile,
            competitors,
            products,
            personas,
            claims,
        })
    }

    /// Facts for the judge. Tone and vocabulary fall back to
    /// `professional` / `moderate` when no profile says otherwise.
    #[must_use]
    pub fn ground_truth(&self) -> GroundTruth {
        let profile = self.profile.as_ref();
        let non_blank = |v: Option<&String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };

        GroundTruth {
            brand_name: self.brand.name.clone(),
            products: self
                .products
                .iter()
                .map(|p| ProductFacts {
                    name: p.name.clone(),
                    features: p.features.clone(),
                    benefits: p.benefits.clone(),
                })
                .collect(),
            claims: self.claims.iter().map(|c| c.claim_text.clone()).collect(),
            competitors: self.competitors.iter().map(|c| c.name.clone()).collect(),
            founding_year: profile.and_then(|p| p.founding_year),
            founders: profile.map(|p| p.founders.clone()).unwrap_or_default(),
            values: profile.map(|p| p.core_values.clone()).unwrap_or_default(),
            voice: VoiceProfile {
                primary_tone: non_blank(profile.and_then(|p| p.primary_tone.as_ref()))
                    .unwrap_or_else(|| DEFAULT_TONE.to_string()),
                vocabulary_level: non_blank(profile.and_then(|p| p.vocabulary_level.as_ref()))
                    .unwrap_or_else(|| DEFAULT_VOCABULARY.to_string()),
                approved_phrases: profile.map(|p| p.approved_phrases.clone()).unwrap_or_default(),
                banned_phrases: profile.map(|p| p.banned_phrases.clone()).unwrap_or_default(),
            },
            misconceptions: profile.map(|p| p.misconceptions.clone()).unwrap_or_default(),
            negative_keywords: profile
                .map(|p| p.negative_keywords.clone())
                .unwrap_or_default(),
        }
    }

    /// Context for the prompt generator. Stored enum values that no longer
    /// parse are treated as unknown rather than failing generation.
    #[must_use]
    pub fn generation_context(&self) -> GenerationContext {
        let profile = self.profile.as_ref();
        GenerationContext {
            brand_name: self.brand.name.clone(),
            industry: self.brand.industry.clone(),
            primary_archetype: profile.and_then(|p| p.primary_archetype.clone()),
            secondary_archetype: profile.and_then(|p| p.secondary_archetype.clone()),
            primary_tone: profile.and_then(|p| p.primary_tone.clone()),
            vocabulary_level: profile.and_then(|p| p.vocabulary_level.clone()),
            personas: self
                .personas
                .iter()
                .map(|p| PersonaInput {
                    name: p.name.clone(),
                    persona_type: p.persona_type.parse().ok(),
                    description: p.description.clone(),
                    pain_points: p.pain_points.clone(),
                    goals: p.goals.clone(),
                    common_questions: p.common_questions.clone(),
                    objections: p.objections.clone(),
                })
                .collect(),
            products: self
                .products
                .iter()
                .map(|p| ProductInput {
                    name: p.name.clone(),
                    category: p.category.clone(),
                    features: p.features.clone(),
                    benefits: p.benefits.clone(),
                    use_cases: p.use_cases.clone(),
                    is_hero: p.is_hero,
                })
                .collect(),
            competitors: self
                .competitors
                .iter()
                .map(|c| CompetitorInput {
                    name: c.name.clone(),
                    threat_level: c.threat_level.parse().ok(),
                })
                .collect(),
            claims: self.claims.iter().map(|c| c.claim_text.clone()).collect(),
            negative_keywords: profile
                .map(|p| p.negative_keywords.clone())
                .unwrap_or_default(),
            misconceptions: profile.map(|p| p.misconceptions.clone()).unwrap_or_default(),
        }
    }
}

impl GroundTruth {
    /// Renders the facts block embedded in judge prompts.
    #[must_use]
    pub fn format_facts(&self) -> String {
        let mut lines = vec![format!("Brand Name: {}", self.brand_name)];

        if let Some(year) = self.founding_year {
            lines.push(format!("Founded: {year}"));
        }
        if !self.founders.is_empty() {
            lines.push(format!("Founders: {}", self.founders.join(", ")));
        }
        if !self.values.is_empty() {
            lines.push(format!("Core Values: {}", self.values.join(", ")));
        }

        if !self.products.is_empty() {
            lines.push("\nProducts:".to_string());
            for product in &self.products {
                lines.push(format!("- {}", product.name));
                if !product.features.is_empty() {
                    lines.push(format!("  Features: {}", product.features.join(", ")));
                }
                if !product.benefits.is_empty() {
                    lines.push(format!("  Benefits: {}", product.benefits.join(", ")));
                }
            }
        }

        if !self.claims.is_empty() {
            lines.push("\nVerified Claims:".to_string());
            lines.extend(self.claims.iter().map(|c| format!("- {c}")));
        }

        if !self.competitors.is_empty() {
            lines.push(format!("\nKnown Competitors: {}", self.competitors.join(", ")));
        }

        lines.join("\n")
    }

    #[must_use]
    pub fn format_voice(&self) -> String {
        let voice = &self.voice;
        let mut lines = Vec::new();
        if !voice.primary_tone.is_empty() {
            lines.push(format!("Primary Tone: {}", voice.primary_tone));
        }
        if !voice.vocabulary_level.is_empty() {
            lines.push(format!("Vocabulary Level: {}", voice.vocabulary_level));
        }
        if !voice.approved_phrases.is_empty() {
            lines.push(format!("Approved Phrases: {}", voice.approved_phrases.join(", ")));
        }
        if !voice.banned_phrases.is_empty() {
            lines.push(format!("Banned Phrases: {}", voice.banned_phrases.join(", ")));
        }
        if lines.is_empty() {
            "No specific voice profile defined".to_string()
        } else {
            lines.join("\n")
        }
    }

    /// Compact one-fact-per-line summary used by correction prompts.
    #[must_use]
    pub fn brand_context(&self) -> String {
        let mut parts = vec![format!("Brand Name: {}", self.brand_name)];
        if !self.products.is_empty() {
            let names: Vec<&str> = self.products.iter().map(|p| p.name.as_str()).collect();
            parts.push(format!("Products: {}", names.join(", ")));
        }
        if !self.claims.is_empty() {
            parts.push(format!("Key Claims: {}", self.claims.join("; ")));
        }
        if !self.competitors.is_empty() {
            parts.push(format!("Competitors: {}", self.competitors.join(", ")));
        }
        if let Some(year) = self.founding_year {
            parts.push(format!("Founded: {year}"));
        }
        if !self.founders.is_empty() {
            parts.push(format!("Founders: {}", self.founders.join(", ")));
        }
        if !self.values.is_empty() {
            parts.push(format!("Values: {}", self.values.join(", ")));
        }
        parts.push(format!("Brand Tone: {}", self.voice.primary_tone));
        parts.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn brand() -> BrandRow {
        BrandRow {
            id: 1,
            public_id: Uuid::nil(),
            name: "Acme".to_string(),
            slug: "acme".to_string(),
            domain: "acme.io".to_string(),
            industry: Some("Analytics".to_string()),
            review_sites: vec![],
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn knowledge() -> BrandKnowledge {
        BrandKnowledge {
            brand: brand(),
            profile: None,
            competitors: vec![BrandCompetitorRow {
                id: 1,
                brand_id: 1,
                name: "Tableau".to_string(),
                competitor_type: "direct".to_string(),
                threat_level: "high".to_string(),
                created_at: Utc::now(),
            }],
            products: vec![BrandProductRow {
                id: 1,
                brand_id: 1,
                name: "Acme Insights".to_string(),
                category: Some("BI".to_string()),
                features: vec!["dashboards".to_string()],
                benefits: vec![],
                use_cases: vec![],
                is_hero: true,
                created_at: Utc::now(),
            }],
            personas: vec![BrandPersonaRow {
                id: 1,
                brand_id: 1,
                name: "Analyst".to_string(),
                persona_type: "bogus".to_string(),
                description: None,
                pain_points: vec![],
                goals: vec![],
                common_questions: vec![],
                objections: vec![],
                created_at: Utc::now(),
            }],
            claims: vec![],
        }
    }

    #[test]
    fn ground_truth_defaults_voice_without_profile() {
        let truth = knowledge().ground_truth();
        assert_eq!(truth.voice.primary_tone, "professional");
        assert_eq!(truth.voice.vocabulary_level, "moderate");
        assert_eq!(truth.competitors, vec!["Tableau"]);
    }

    #[test]
    fn facts_block_lists_products_and_competitors() {
        let text = knowledge().ground_truth().format_facts();
        assert!(text.starts_with("Brand Name: Acme"));
        assert!(text.contains("- Acme Insights\n  Features: dashboards"));
        assert!(text.contains("Known Competitors: Tableau"));
        assert!(!text.contains("Founded"));
    }

    #[test]
    fn voice_block_falls_back_when_empty() {
        let truth = GroundTruth::default();
        assert_eq!(truth.format_voice(), "No specific voice profile defined");
    }

    #[test]
    fn generation_context_ignores_unknown_persona_type() {
        let ctx = knowledge().generation_context();
        assert_eq!(ctx.personas[0].persona_type, None);
        assert_eq!(
            ctx.competitors[0].threat_level,
            Some(aeo_core::ThreatLevel::High)
        );
        assert_eq!(ctx.product_category(), "BI");
    }
}
