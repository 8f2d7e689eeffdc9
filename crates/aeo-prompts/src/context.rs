//! Brand knowledge the generator templates against.

use aeo_core::{BrandConfig, PersonaType, ThreatLevel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonaInput {
    pub name: String,
    pub persona_type: Option<PersonaType>,
    pub description: Option<String>,
    pub pain_points: Vec<String>,
    pub goals: Vec<String>,
    pub common_questions: Vec<String>,
    pub objections: Vec<String>,
}

impl PersonaInput {
    /// Priority multiplier; unknown persona types weigh 1.0.
    #[must_use]
    pub fn multiplier(&self) -> f64 {
        self.persona_type.map_or(1.0, PersonaType::multiplier)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub category: Option<String>,
    pub features: Vec<String>,
    pub benefits: Vec<String>,
    pub use_cases: Vec<String>,
    pub is_hero: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompetitorInput {
    pub name: String,
    pub threat_level: Option<ThreatLevel>,
}

impl CompetitorInput {
    #[must_use]
    pub fn multiplier(&self) -> f64 {
        self.threat_level.map_or(1.0, ThreatLevel::multiplier)
    }
}

/// Everything known about a brand that prompts can reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationContext {
    pub brand_name: String,
    pub industry: Option<String>,
    pub primary_archetype: Option<String>,
    pub secondary_archetype: Option<String>,
    pub primary_tone: Option<String>,
    pub vocabulary_level: Option<String>,
    pub personas: Vec<PersonaInput>,
    pub products: Vec<ProductInput>,
    pub competitors: Vec<CompetitorInput>,
    pub claims: Vec<String>,
    pub negative_keywords: Vec<String>,
    pub misconceptions: Vec<String>,
}

impl GenerationContext {
    /// The hero product, else the first product.
    #[must_use]
    pub fn primary_product(&self) -> Option<&ProductInput> {
        self.products
            .iter()
            .find(|p| p.is_hero)
            .or_else(|| self.products.first())
    }

    /// Category of the primary product, defaulting to `software`.
    #[must_use]
    pub fn product_category(&self) -> &str {
        self.primary_product()
            .and_then(|p| p.category.as_deref())
            .filter(|c| !c.trim().is_empty())
            .unwrap_or("software")
    }

    /// Seeds a context from the brands file. Archetype and tone are unknown
    /// until a profile has been extracted.
    #[must_use]
    pub fn from_brand_config(brand: &BrandConfig) -> Self {
        Self {
            brand_name: brand.name.clone(),
            industry: brand.industry.clone(),
            personas: brand
                .personas
                .iter()
                .map(|p| PersonaInput {
                    name: p.name.clone(),
                    persona_type: Some(p.persona_type),
                    description: p.description.clone(),
                    pain_points: p.pain_points.clone(),
                    goals: p.goals.clone(),
                    common_questions: p.common_questions.clone(),
                    objections: p.objections.clone(),
                })
                .collect(),
            products: brand
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
            competitors: brand
                .competitors
                .iter()
                .map(|c| CompetitorInput {
                    name: c.name.clone(),
                    threat_level: Some(c.threat_level),
                })
                .collect(),
            claims: brand.claims.iter().map(|c| c.text.clone()).collect(),
            negative_keywords: brand.risk_factors.negative_keywords.clone(),
            misconceptions: brand.risk_factors.misconceptions.clone(),
            ..Self::default()
        }
    }
}
