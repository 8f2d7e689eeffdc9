//! Database operations for `brand_profiles` and the per-brand relation
//! tables (`brand_competitors`, `brand_products`, `brand_personas`,
//! `brand_claims`) that together form the scan ground truth.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandProfileRow {
    pub id: i64,
    pub brand_id: i64,
    pub profile: serde_json::Value,
    pub source_url: Option<String>,
    pub overall_confidence: Option<f64>,
    pub tagline: Option<String>,
    pub mission: Option<String>,
    pub founding_year: Option<i32>,
    pub founders: Vec<String>,
    pub core_values: Vec<String>,
    pub primary_archetype: Option<String>,
    pub secondary_archetype: Option<String>,
    pub primary_tone: Option<String>,
    pub vocabulary_level: Option<String>,
    pub approved_phrases: Vec<String>,
    pub banned_phrases: Vec<String>,
    pub negative_keywords: Vec<String>,
    pub misconceptions: Vec<String>,
    pub extracted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandCompetitorRow {
    pub id: i64,
    pub brand_id: i64,
    pub name: String,
    pub competitor_type: String,
    pub threat_level: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandProductRow {
    pub id: i64,
    pub brand_id: i64,
    pub name: String,
    pub category: Option<String>,
    pub features: Vec<String>,
    pub benefits: Vec<String>,
    pub use_cases: Vec<String>,
    pub is_hero: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandPersonaRow {
    pub id: i64,
    pub brand_id: i64,
    pub name: String,
    pub persona_type: String,
    pub description: Option<String>,
    pub pain_points: Vec<String>,
    pub goals: Vec<String>,
    pub common_questions: Vec<String>,
    pub objections: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandClaimRow {
    pub id: i64,
    pub brand_id: i64,
    pub claim_text: String,
    pub claim_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Write inputs
// ---------------------------------------------------------------------------

/// Profile columns written by [`upsert_brand_profile`].
///
/// `None` / empty values never overwrite previously stored facts, so a partial
/// extraction does not erase curated data.
#[derive(Debug, Clone, Default)]
pub struct NewBrandProfile {
    pub profile: serde_json::Value,
    pub source_url: Option<String>,
    pub overall_confidence: Option<f64>,
    pub tagline: Option<String>,
    pub mission: Option<String>,
    pub founding_year: Option<i32>,
    pub founders: Vec<String>,
    pub core_values: Vec<String>,
    pub primary_archetype: Option<String>,
    pub secondary_archetype: Option<String>,
    pub primary_tone: Option<String>,
    pub vocabulary_level: Option<String>,
    pub approved_phrases: Vec<String>,
    pub banned_phrases: Vec<String>,
    pub negative_keywords: Vec<String>,
    pub misconceptions: Vec<String>,
    pub extracted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewBrandCompetitor {
    pub name: String,
    pub competitor_type: String,
    pub threat_level: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewBrandProduct {
    pub name: String,
    pub category: Option<String>,
    pub features: Vec<String>,
    pub benefits: Vec<String>,
    pub use_cases: Vec<String>,
    pub is_hero: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NewBrandPersona {
    pub name: String,
    pub persona_type: String,
    pub description: Option<String>,
    pub pain_points: Vec<String>,
    pub goals: Vec<String>,
    pub common_questions: Vec<String>,
    pub objections: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewBrandClaim {
    pub claim_text: String,
    pub claim_type: Option<String>,
}

const PROFILE_COLUMNS: &str = "id, brand_id, profile, source_url, overall_confidence, tagline, \
     mission, founding_year, founders, core_values, primary_archetype, secondary_archetype, \
     primary_tone, vocabulary_level, approved_phrases, banned_phrases, negative_keywords, \
     misconceptions, extracted_at, created_at, updated_at";

// ---------------------------------------------------------------------------
// Profile operations
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_brand_profile(
    pool: &PgPool,
    brand_id: i64,
) -> Result<Option<BrandProfileRow>, DbError> {
    let row = sqlx::query_as::<_, BrandProfileRow>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM brand_profiles WHERE brand_id = $1"
    ))
    .bind(brand_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts or updates the profile for a brand. The JSON document is always
/// replaced; scalar and array facts keep their stored value when the new
/// value is absent or empty.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_brand_profile(
    pool: &PgPool,
    brand_id: i64,
    profile: &NewBrandProfile,
) -> Result<BrandProfileRow, DbError> {
    upsert_profile_row(pool, brand_id, profile).await
}

async fn upsert_profile_row<'e, E>(
    executor: E,
    brand_id: i64,
    profile: &NewBrandProfile,
) -> Result<BrandProfileRow, DbError>
where
    E: sqlx::PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, BrandProfileRow>(&format!(
        "INSERT INTO brand_profiles (brand_id, profile, source_url, overall_confidence, tagline, \
             mission, founding_year, founders, core_values, primary_archetype, \
             secondary_archetype, primary_tone, vocabulary_level, approved_phrases, \
             banned_phrases, negative_keywords, misconceptions, extracted_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
         ON CONFLICT (brand_id) DO UPDATE SET \
             profile = EXCLUDED.profile, \
             source_url = COALESCE(EXCLUDED.source_url, brand_profiles.source_url), \
             overall_confidence = \
                 COALESCE(EXCLUDED.overall_confidence, brand_profiles.overall_confidence), \
             tagline = COALESCE(EXCLUDED.tagline, brand_profiles.tagline), \
             mission = COALESCE(EXCLUDED.mission, brand_profiles.mission), \
             founding_year = COALESCE(EXCLUDED.founding_year, brand_profiles.founding_year), \
             founders = CASE WHEN cardinality(EXCLUDED.founders) > 0 \
                 THEN EXCLUDED.founders ELSE brand_profiles.founders END, \
             core_values = CASE WHEN cardinality(EXCLUDED.core_values) > 0 \
                 THEN EXCLUDED.core_values ELSE brand_profiles.core_values END, \
             primary_archetype = \
                 COALESCE(EXCLUDED.primary_archetype, brand_profiles.primary_archetype), \
             secondary_archetype = \
                 COALESCE(EXCLUDED.secondary_archetype, brand_profiles.secondary_archetype), \
             primary_tone = COALESCE(EXCLUDED.primary_tone, brand_profiles.primary_tone), \
             vocabulary_level = \
                 COALESCE(EXCLUDED.vocabulary_level, brand_profiles.vocabulary_level), \
             approved_phrases = CASE WHEN cardinality(EXCLUDED.approved_phrases) > 0 \
                 THEN EXCLUDED.approved_phrases ELSE brand_profiles.approved_phrases END, \
             banned_phrases = CASE WHEN cardinality(EXCLUDED.banned_phrases) > 0 \
                 THEN EXCLUDED.banned_phrases ELSE brand_profiles.banned_phrases END, \
             negative_keywords = CASE WHEN cardinality(EXCLUDED.negative_keywords) > 0 \
                 THEN EXCLUDED.negative_keywords ELSE brand_profiles.negative_keywords END, \
             misconceptions = CASE WHEN cardinality(EXCLUDED.misconceptions) > 0 \
                 THEN EXCLUDED.misconceptions ELSE brand_profiles.misconceptions END, \
             extracted_at = COALESCE(EXCLUDED.extracted_at, brand_profiles.extracted_at), \
             updated_at = NOW() \
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(brand_id)
    .bind(&profile.profile)
    .bind(&profile.source_url)
    .bind(profile.overall_confidence)
    .bind(&profile.tagline)
    .bind(&profile.mission)
    .bind(profile.founding_year)
    .bind(&profile.founders)
    .bind(&profile.core_values)
    .bind(&profile.primary_archetype)
    .bind(&profile.secondary_archetype)
    .bind(&profile.primary_tone)
    .bind(&profile.vocabulary_level)
    .bind(&profile.approved_phrases)
    .bind(&profile.banned_phrases)
    .bind(&profile.negative_keywords)
    .bind(&profile.misconceptions)
    .bind(profile.extracted_at)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

// ---------------------------------------------------------------------------
// Relation operations
// ---------------------------------------------------------------------------

/// Relation rows derived from one brand profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrandRelations<'a> {
    pub competitors: &'a [NewBrandCompetitor],
    pub products: &'a [NewBrandProduct],
    pub personas: &'a [NewBrandPersona],
    pub claims: &'a [NewBrandClaim],
}

/// Stores a profile and replaces its relations in one transaction.
///
/// Each non-empty relation set replaces the stored one: rows whose name (or
/// claim text) is absent are deleted and the rest are upserted. An empty set
/// leaves that relation untouched, matching how empty profile arrays keep
/// curated values.
///
/// Returns the stored profile and the number of relation rows written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; nothing is kept.
pub async fn save_brand_profile(
    pool: &PgPool,
    brand_id: i64,
    profile: &NewBrandProfile,
    relations: &BrandRelations<'_>,
) -> Result<(BrandProfileRow, usize), DbError> {
    let mut tx = pool.begin().await?;
    let row = upsert_profile_row(&mut *tx, brand_id, profile).await?;
    prune_relations(&mut tx, brand_id, relations).await?;
    let written = write_relations(
        &mut tx,
        brand_id,
        relations.competitors,
        relations.products,
        relations.personas,
        relations.claims,
    )
    .await?;
    tx.commit().await?;
    Ok((row, written))
}

async fn prune_relations(
    tx: &mut Transaction<'_, Postgres>,
    brand_id: i64,
    relations: &BrandRelations<'_>,
) -> Result<(), DbError> {
    let keep: [(&str, &str, Vec<String>); 4] = [
        (
            "brand_competitors",
            "name",
            relations.competitors.iter().map(|c| c.name.clone()).collect(),
        ),
        (
            "brand_products",
            "name",
            relations.products.iter().map(|p| p.name.clone()).collect(),
        ),
        (
            "brand_personas",
            "name",
            relations.personas.iter().map(|p| p.name.clone()).collect(),
        ),
        (
            "brand_claims",
            "claim_text",
            relations.claims.iter().map(|c| c.claim_text.clone()).collect(),
        ),
    ];

    for (table, key, names) in keep {
        if names.is_empty() {
            continue;
        }
        sqlx::query(&format!(
            "DELETE FROM {table} WHERE brand_id = $1 AND NOT ({key} = ANY($2))"
        ))
        .bind(brand_id)
        .bind(&names)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

pub(crate) async fn write_relations(
    tx: &mut Transaction<'_, Postgres>,
    brand_id: i64,
    competitors: &[NewBrandCompetitor],
    products: &[NewBrandProduct],
    personas: &[NewBrandPersona],
    claims: &[NewBrandClaim],
) -> Result<usize, DbError> {
    let mut written = 0usize;
    for c in competitors {
        sqlx::query(
            "INSERT INTO brand_competitors (brand_id, name, competitor_type, threat_level) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (brand_id, name) DO UPDATE SET \
                 competitor_type = EXCLUDED.competitor_type, \
                 threat_level = EXCLUDED.threat_level",
        )
        .bind(brand_id)
        .bind(&c.name)
        .bind(&c.competitor_type)
        .bind(&c.threat_level)
        .execute(&mut **tx)
        .await?;
        written += 1;
    }

    for p in products {
        sqlx::query(
            "INSERT INTO brand_products (brand_id, name, category, features, benefits, use_cases, is_hero) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (brand_id, name) DO UPDATE SET \
                 category = COALESCE(EXCLUDED.category, brand_products.category), \
                 features = CASE WHEN cardinality(EXCLUDED.features) > 0 \
                     THEN EXCLUDED.features ELSE brand_products.features END, \
                 benefits = CASE WHEN cardinality(EXCLUDED.benefits) > 0 \
                     THEN EXCLUDED.benefits ELSE brand_products.benefits END, \
                 use_cases = CASE WHEN cardinality(EXCLUDED.use_cases) > 0 \
                     THEN EXCLUDED.use_cases ELSE brand_products.use_cases END, \
                 is_hero = EXCLUDED.is_hero",
        )
        .bind(brand_id)
        .bind(&p.name)
        .bind(&p.category)
        .bind(&p.features)
        .bind(&p.benefits)
        .bind(&p.use_cases)
        .bind(p.is_hero)
        .execute(&mut **tx)
        .await?;
        written += 1;
    }

    for p in personas {
        sqlx::query(
            "INSERT INTO brand_personas (brand_id, name, persona_type, description, pain_points, \
                 goals, common_questions, objections) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (brand_id, name) DO UPDATE SET \
                 persona_type = EXCLUDED.persona_type, \
                 description = COALESCE(EXCLUDED.description, brand_personas.description), \
                 pain_points = EXCLUDED.pain_points, \
                 goals = EXCLUDED.goals, \
                 common_questions = EXCLUDED.common_questions, \
                 objections = EXCLUDED.objections",
        )
        .bind(brand_id)
        .bind(&p.name)
        .bind(&p.persona_type)
        .bind(&p.description)
        .bind(&p.pain_points)
        .bind(&p.goals)
        .bind(&p.common_questions)
        .bind(&p.objections)
        .execute(&mut **tx)
        .await?;
        written += 1;
    }

    for c in claims {
        sqlx::query(
            "INSERT INTO brand_claims (brand_id, claim_text, claim_type) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (brand_id, claim_text) DO UPDATE SET \
                 claim_type = COALESCE(EXCLUDED.claim_type, brand_claims.claim_type)",
        )
        .bind(brand_id)
        .bind(&c.claim_text)
        .bind(&c.claim_type)
        .execute(&mut **tx)
        .await?;
        written += 1;
    }

    Ok(written)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_brand_competitors(
    pool: &PgPool,
    brand_id: i64,
) -> Result<Vec<BrandCompetitorRow>, DbError> {
    let rows = sqlx::query_as::<_, BrandCompetitorRow>(
        "SELECT id, brand_id, name, competitor_type, threat_level, created_at \
         FROM brand_competitors WHERE brand_id = $1 ORDER BY id",
    )
    .bind(brand_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Products, hero products first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_brand_products(
    pool: &PgPool,
    brand_id: i64,
) -> Result<Vec<BrandProductRow>, DbError> {
    let rows = sqlx::query_as::<_, BrandProductRow>(
        "SELECT id, brand_id, name, category, features, benefits, use_cases, is_hero, created_at \
         FROM brand_products WHERE brand_id = $1 ORDER BY is_hero DESC, id",
    )
    .bind(brand_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_brand_personas(
    pool: &PgPool,
    brand_id: i64,
) -> Result<Vec<BrandPersonaRow>, DbError> {
    let rows = sqlx::query_as::<_, BrandPersonaRow>(
        "SELECT id, brand_id, name, persona_type, description, pain_points, goals, \
                common_questions, objections, created_at \
         FROM brand_personas WHERE brand_id = $1 ORDER BY id",
    )
    .bind(brand_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_brand_claims(
    pool: &PgPool,
    brand_id: i64,
) -> Result<Vec<BrandClaimRow>, DbError> {
    let rows = sqlx::query_as::<_, BrandClaimRow>(
        "SELECT id, brand_id, claim_text, claim_type, created_at \
         FROM brand_claims WHERE brand_id = $1 ORDER BY id",
    )
    .bind(brand_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
