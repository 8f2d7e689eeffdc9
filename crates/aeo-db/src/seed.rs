use aeo_core::brands::BrandConfig;
use sqlx::PgPool;
use uuid::Uuid;

use crate::brand_profiles::{
    write_relations, NewBrandClaim, NewBrandCompetitor, NewBrandPersona, NewBrandProduct,
};
use crate::DbError;

/// Upsert brands from config, together with their declared competitors,
/// products, personas, claims and risk factors.
///
/// Returns the number of brands processed. Everything runs in a single
/// transaction; any failure rolls back the whole batch.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_brands(pool: &PgPool, brands: &[BrandConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for brand in brands {
        let brand_id: i64 = sqlx::query_scalar(
            "INSERT INTO brands (public_id, name, slug, domain, industry, review_sites, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, true) \
             ON CONFLICT (slug) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 domain = EXCLUDED.domain, \
                 industry = COALESCE(EXCLUDED.industry, brands.industry), \
                 review_sites = EXCLUDED.review_sites, \
                 is_active = true, \
                 updated_at = NOW() \
             RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(&brand.name)
        .bind(brand.slug())
        .bind(&brand.domain)
        .bind(&brand.industry)
        .bind(&brand.review_sites)
        .fetch_one(&mut *tx)
        .await?;

        let risk = &brand.risk_factors;
        if !risk.negative_keywords.is_empty() || !risk.misconceptions.is_empty() {
            sqlx::query(
                "INSERT INTO brand_profiles (brand_id, negative_keywords, misconceptions) \
                 VALUES ($1, $2, $3) \
                 ON CONFLICT (brand_id) DO UPDATE SET \
                     negative_keywords = EXCLUDED.negative_keywords, \
                     misconceptions = EXCLUDED.misconceptions, \
                     updated_at = NOW()",
            )
            .bind(brand_id)
            .bind(&risk.negative_keywords)
            .bind(&risk.misconceptions)
            .execute(&mut *tx)
            .await?;
        }

        let competitors: Vec<NewBrandCompetitor> = brand
            .competitors
            .iter()
            .map(|c| NewBrandCompetitor {
                name: c.name.clone(),
                competitor_type: c.competitor_type.clone(),
                threat_level: c.threat_level.to_string(),
            })
            .collect();
        let products: Vec<NewBrandProduct> = brand
            .products
            .iter()
            .map(|p| NewBrandProduct {
                name: p.name.clone(),
                category: p.category.clone(),
                features: p.features.clone(),
                benefits: p.benefits.clone(),
                use_cases: p.use_cases.clone(),
                is_hero: p.is_hero,
            })
            .collect();
        let personas: Vec<NewBrandPersona> = brand
            .personas
            .iter()
            .map(|p| NewBrandPersona {
                name: p.name.clone(),
                persona_type: p.persona_type.to_string(),
                description: p.description.clone(),
                pain_points: p.pain_points.clone(),
                goals: p.goals.clone(),
                common_questions: p.common_questions.clone(),
                objections: p.objections.clone(),
            })
            .collect();
        let claims: Vec<NewBrandClaim> = brand
            .claims
            .iter()
            .map(|c| NewBrandClaim {
                claim_text: c.text.clone(),
                claim_type: c.claim_type.clone(),
            })
            .collect();

        write_relations(&mut tx, brand_id, &competitors, &products, &personas, &claims).await?;
        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
