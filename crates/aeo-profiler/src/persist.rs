//! Flattening an extracted profile into brand-profile rows.

use aeo_db::{
    save_brand_profile, BrandProfileRow, BrandRelations, NewBrandClaim, NewBrandCompetitor,
    NewBrandPersona, NewBrandProduct, NewBrandProfile,
};
use chrono::Utc;
use sqlx::PgPool;

use crate::error::ProfilerError;
use crate::profile::Brand360Profile;

/// Everything written for one brand after an analysis.
#[derive(Debug, Clone, Default)]
pub struct ProfileSeed {
    pub profile: NewBrandProfile,
    pub competitors: Vec<NewBrandCompetitor>,
    pub products: Vec<NewBrandProduct>,
    pub personas: Vec<NewBrandPersona>,
    pub claims: Vec<NewBrandClaim>,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn cleaned(values: &[String]) -> Vec<String> {
    values.iter().filter_map(|v| non_empty(v)).collect()
}

fn threat_level(competitor_type: &str) -> &'static str {
    match competitor_type.trim().to_ascii_lowercase().as_str() {
        "direct" => "high",
        "aspirational" => "low",
        _ => "medium",
    }
}

impl ProfileSeed {
    /// Builds the rows for `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`ProfilerError::Json`] if the profile cannot be serialized.
    pub fn from_profile(profile: &Brand360Profile) -> Result<Self, ProfilerError> {
        let identity = &profile.brand_identity;
        let voice = &profile.brand_voice;

        let record = NewBrandProfile {
            profile: serde_json::to_value(profile)?,
            source_url: non_empty(&profile.source_url),
            overall_confidence: Some(profile.profile_metadata.overall_confidence),
            tagline: identity.tagline.as_deref().and_then(non_empty),
            mission: non_empty(&identity.mission.statement),
            founding_year: profile.founding_year(),
            founders: Vec::new(),
            core_values: identity
                .core_values
                .iter()
                .filter_map(|v| non_empty(&v.value))
                .collect(),
            primary_archetype: non_empty(&voice.primary_archetype),
            secondary_archetype: voice.secondary_archetype.as_deref().and_then(non_empty),
            primary_tone: non_empty(&voice.primary_tone),
            vocabulary_level: voice
                .voice_attributes
                .complexity
                .as_deref()
                .and_then(non_empty),
            approved_phrases: cleaned(&voice.signature_phrases),
            banned_phrases: cleaned(&voice.language_to_avoid),
            negative_keywords: cleaned(&profile.ai_guidance.inaccurate_descriptors),
            misconceptions: Vec::new(),
            extracted_at: Some(Utc::now()),
        };

        let competitors = profile
            .competitive_landscape
            .competitors
            .iter()
            .filter_map(|c| {
                let name = non_empty(&c.name)?;
                let competitor_type =
                    non_empty(&c.competitor_type).unwrap_or_else(|| "direct".to_owned());
                Some(NewBrandCompetitor {
                    name,
                    threat_level: threat_level(&competitor_type).to_owned(),
                    competitor_type: competitor_type.to_ascii_lowercase(),
                })
            })
            .collect();

        let portfolio = &profile.product_portfolio;
        let mut products: Vec<NewBrandProduct> = portfolio
            .hero_offerings
            .iter()
            .filter_map(|h| {
                Some(NewBrandProduct {
                    name: non_empty(&h.name)?,
                    benefits: cleaned(&h.key_benefits),
                    features: non_empty(&h.description).into_iter().collect(),
                    is_hero: true,
                    ..NewBrandProduct::default()
                })
            })
            .collect();
        for category in &portfolio.categories {
            let Some(name) = non_empty(&category.name) else {
                continue;
            };
            if products.iter().any(|p| p.name.eq_ignore_ascii_case(&name)) {
                continue;
            }
            products.push(NewBrandProduct {
                category: Some(name.clone()),
                name,
                features: non_empty(&category.description).into_iter().collect(),
                ..NewBrandProduct::default()
            });
        }

        let audience = &profile.target_audience;
        let mut personas = Vec::new();
        if let Some(name) = non_empty(&audience.primary_segment.name) {
            let segment = &audience.primary_segment;
            personas.push(NewBrandPersona {
                name,
                persona_type: "primary".to_owned(),
                description: non_empty(&segment.description),
                pain_points: cleaned(&segment.pain_points),
                goals: cleaned(&segment.motivations),
                common_questions: Vec::new(),
                objections: cleaned(&segment.decision_factors),
            });
        }
        personas.extend(audience.secondary_segments.iter().filter_map(|s| {
            Some(NewBrandPersona {
                name: non_empty(&s.name)?,
                persona_type: "secondary".to_owned(),
                description: non_empty(&s.description),
                ..NewBrandPersona::default()
            })
        }));

        let mut claims: Vec<NewBrandClaim> = Vec::new();
        let claim_sources = [
            ("quality", &portfolio.quality_signals),
            ("selling_point", &profile.ai_guidance.key_selling_points),
            ("differentiator", &profile.competitive_landscape.competitive_advantages),
        ];
        for (claim_type, texts) in claim_sources {
            for text in cleaned(texts) {
                if claims.iter().all(|c| c.claim_text != text) {
                    claims.push(NewBrandClaim {
                        claim_text: text,
                        claim_type: Some(claim_type.to_owned()),
                    });
                }
            }
        }

        Ok(Self {
            profile: record,
            competitors,
            products,
            personas,
            claims,
        })
    }
}

/// Stores the profile document and its relations for `brand_id`.
///
/// # Errors
///
/// Returns [`ProfilerError::Json`] if serialization fails or
/// [`ProfilerError::Db`] if a write fails.
pub async fn save_profile(
    pool: &PgPool,
    brand_id: i64,
    profile: &Brand360Profile,
) -> Result<BrandProfileRow, ProfilerError> {
    let seed = ProfileSeed::from_profile(profile)?;
    let (row, relations) = save_brand_profile(
        pool,
        brand_id,
        &seed.profile,
        &BrandRelations {
            competitors: &seed.competitors,
            products: &seed.products,
            personas: &seed.personas,
            claims: &seed.claims,
        },
    )
    .await?;

    tracing::info!(
        brand_id,
        competitors = seed.competitors.len(),
        products = seed.products.len(),
        personas = seed.personas.len(),
        claims = seed.claims.len(),
        relations,
        "brand profile saved"
    );
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{
        AudienceSegment, Competitor, CoreValue, HeroOffering, ProductCategory, SegmentSummary,
    };

    fn sample() -> Brand360Profile {
        let mut p = Brand360Profile::default();
        p.source_url = "https://acme.example".to_owned();
        p.brand_identity.brand_name = "Acme".to_owned();
        p.brand_identity.tagline = Some("  Numbers, clearly ".to_owned());
        p.brand_identity.mission.statement = "Make revenue visible".to_owned();
        p.brand_identity.founding_year = Some("Founded in 2014".to_owned());
        p.brand_identity.core_values = vec![
            CoreValue {
                value: "Clarity".to_owned(),
                description: String::new(),
            },
            CoreValue::default(),
        ];
        p.brand_voice.primary_archetype = "Sage".to_owned();
        p.brand_voice.voice_attributes.complexity = Some("technical".to_owned());
        p.brand_voice.signature_phrases = vec!["See it all".to_owned(), " ".to_owned()];
        p.brand_voice.language_to_avoid = vec!["cheap".to_owned()];
        p.ai_guidance.inaccurate_descriptors = vec!["spreadsheet".to_owned()];
        p.ai_guidance.key_selling_points = vec!["SOC 2 certified".to_owned()];
        p.product_portfolio.quality_signals = vec!["SOC 2 certified".to_owned()];
        p.product_portfolio.hero_offerings = vec![HeroOffering {
            name: "Dashboards".to_owned(),
            description: "Live revenue dashboards".to_owned(),
            key_benefits: vec!["Real-time".to_owned()],
        }];
        p.product_portfolio.categories = vec![
            ProductCategory {
                name: "dashboards".to_owned(),
                ..ProductCategory::default()
            },
            ProductCategory {
                name: "Forecasting".to_owned(),
                description: "Pipeline forecasts".to_owned(),
                product_count: Some(2),
            },
        ];
        p.competitive_landscape.competitors = vec![
            Competitor {
                name: "Looker".to_owned(),
                competitor_type: "Direct".to_owned(),
                ..Competitor::default()
            },
            Competitor {
                name: "Tableau".to_owned(),
                competitor_type: "aspirational".to_owned(),
                ..Competitor::default()
            },
            Competitor {
                name: "Spreadsheets".to_owned(),
                ..Competitor::default()
            },
            Competitor::default(),
        ];
        p.target_audience.primary_segment = AudienceSegment {
            name: "RevOps leads".to_owned(),
            pain_points: vec!["Manual reporting".to_owned()],
            motivations: vec!["Accurate forecasts".to_owned()],
            ..AudienceSegment::default()
        };
        p.target_audience.secondary_segments = vec![SegmentSummary {
            name: "CFOs".to_owned(),
            description: "Finance leaders".to_owned(),
        }];
        p.profile_metadata.overall_confidence = 0.8;
        p
    }

    #[test]
    fn profile_facts_are_trimmed_and_filtered() {
        let seed = ProfileSeed::from_profile(&sample()).unwrap();
        let profile = &seed.profile;

        assert_eq!(profile.tagline.as_deref(), Some("Numbers, clearly"));
        assert_eq!(profile.founding_year, Some(2014));
        assert_eq!(profile.core_values, vec!["Clarity"]);
        assert_eq!(profile.vocabulary_level.as_deref(), Some("technical"));
        assert_eq!(profile.approved_phrases, vec!["See it all"]);
        assert_eq!(profile.banned_phrases, vec!["cheap"]);
        assert_eq!(profile.negative_keywords, vec!["spreadsheet"]);
        assert_eq!(profile.overall_confidence, Some(0.8));
        assert_eq!(profile.profile["brandIdentity"]["brandName"], "Acme");
        assert!(profile.extracted_at.is_some());
    }

    #[test]
    fn competitors_get_threat_levels_by_type() {
        let seed = ProfileSeed::from_profile(&sample()).unwrap();
        let got: Vec<(&str, &str, &str)> = seed
            .competitors
            .iter()
            .map(|c| (c.name.as_str(), c.competitor_type.as_str(), c.threat_level.as_str()))
            .collect();
        assert_eq!(
            got,
            vec![
                ("Looker", "direct", "high"),
                ("Tableau", "aspirational", "low"),
                ("Spreadsheets", "direct", "high"),
            ]
        );
    }

    #[test]
    fn hero_offerings_come_first_and_categories_do_not_duplicate() {
        let seed = ProfileSeed::from_profile(&sample()).unwrap();
        assert_eq!(seed.products.len(), 2);
        assert!(seed.products[0].is_hero);
        assert_eq!(seed.products[0].benefits, vec!["Real-time"]);
        assert_eq!(seed.products[1].name, "Forecasting");
        assert_eq!(seed.products[1].category.as_deref(), Some("Forecasting"));
        assert!(!seed.products[1].is_hero);
    }

    #[test]
    fn personas_and_claims() {
        let seed = ProfileSeed::from_profile(&sample()).unwrap();
        assert_eq!(seed.personas.len(), 2);
        assert_eq!(seed.personas[0].persona_type, "primary");
        assert_eq!(seed.personas[0].goals, vec!["Accurate forecasts"]);
        assert_eq!(seed.personas[1].persona_type, "secondary");
        assert_eq!(seed.personas[1].description.as_deref(), Some("Finance leaders"));

        assert_eq!(seed.claims.len(), 1, "duplicate claim text is kept once");
        assert_eq!(seed.claims[0].claim_type.as_deref(), Some("quality"));
    }

    #[test]
    fn empty_profile_yields_no_relations() {
        let seed = ProfileSeed::from_profile(&Brand360Profile::default()).unwrap();
        assert!(seed.competitors.is_empty());
        assert!(seed.products.is_empty());
        assert!(seed.personas.is_empty());
        assert!(seed.claims.is_empty());
        assert!(seed.profile.mission.is_none());
        assert!(seed.profile.source_url.is_none());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn saving_again_replaces_relations(pool: PgPool) {
        let brand = aeo_db::create_brand(
            &pool,
            &aeo_db::NewBrand {
                name: "Acme",
                slug: "acme",
                domain: "acme.example",
                industry: None,
                review_sites: &[],
            },
        )
        .await
        .expect("create_brand failed");

        save_profile(&pool, brand.id, &sample()).await.expect("first save");
        let products = aeo_db::list_brand_products(&pool, brand.id).await.unwrap();
        assert!(products.iter().any(|p| p.name == "Dashboards" && p.is_hero));

        let mut revised = sample();
        revised.competitive_landscape.competitors.retain(|c| c.name == "Looker");
        revised.product_portfolio.hero_offerings.clear();
        revised.target_audience = Default::default();
        save_profile(&pool, brand.id, &revised).await.expect("second save");

        let competitors: Vec<String> = aeo_db::list_brand_competitors(&pool, brand.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(competitors, vec!["Looker"]);

        let products = aeo_db::list_brand_products(&pool, brand.id).await.unwrap();
        let mut names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["Forecasting", "dashboards"]);
        assert!(products.iter().all(|p| !p.is_hero));

        // No personas in the revision: the stored ones stay.
        let personas = aeo_db::list_brand_personas(&pool, brand.id).await.unwrap();
        assert_eq!(personas.len(), 2);
    }
}
