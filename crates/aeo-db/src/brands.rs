//! Database operations for the `brands` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `brands` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BrandRow {
    pub id: i64,
    pub public_id: Uuid,
    pub name: String,
    pub slug: String,
    pub domain: String,
    pub industry: Option<String>,
    pub review_sites: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`create_brand`].
#[derive(Debug, Clone)]
pub struct NewBrand<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub domain: &'a str,
    pub industry: Option<&'a str>,
    pub review_sites: &'a [String],
}

const BRAND_COLUMNS: &str =
    "id, public_id, name, slug, domain, industry, review_sites, is_active, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns all active brands, ordered by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_brands(pool: &PgPool) -> Result<Vec<BrandRow>, DbError> {
    let rows = sqlx::query_as::<_, BrandRow>(&format!(
        "SELECT {BRAND_COLUMNS} FROM brands WHERE is_active = true ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns active brands that already have a stored profile; these are the
/// brands eligible for scheduled scans.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_brands_with_profiles(pool: &PgPool) -> Result<Vec<BrandRow>, DbError> {
    let rows = sqlx::query_as::<_, BrandRow>(
        "SELECT b.id, b.public_id, b.name, b.slug, b.domain, b.industry, b.review_sites, \
                b.is_active, b.created_at, b.updated_at \
         FROM brands b \
         JOIN brand_profiles p ON p.brand_id = b.id \
         WHERE b.is_active = true \
         ORDER BY b.name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single active brand by slug, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_brand_by_slug(pool: &PgPool, slug: &str) -> Result<Option<BrandRow>, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(&format!(
        "SELECT {BRAND_COLUMNS} FROM brands WHERE slug = $1 AND is_active = true"
    ))
    .bind(slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no brand has this id.
pub async fn get_brand_by_id(pool: &PgPool, id: i64) -> Result<BrandRow, DbError> {
    sqlx::query_as::<_, BrandRow>(&format!("SELECT {BRAND_COLUMNS} FROM brands WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(DbError::NotFound)
}

/// Inserts a brand. A slug collision surfaces as a unique-violation
/// [`DbError::Sqlx`] for the caller to map to a conflict.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_brand(pool: &PgPool, brand: &NewBrand<'_>) -> Result<BrandRow, DbError> {
    let row = sqlx::query_as::<_, BrandRow>(&format!(
        "INSERT INTO brands (public_id, name, slug, domain, industry, review_sites) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {BRAND_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(brand.name)
    .bind(brand.slug)
    .bind(brand.domain)
    .bind(brand.industry)
    .bind(brand.review_sites)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
