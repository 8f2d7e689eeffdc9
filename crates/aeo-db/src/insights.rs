//! Database operations for `perception_insights`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InsightRow {
    pub id: i64,
    pub public_id: Uuid,
    pub brand_id: i64,
    pub scan_id: Option<i64>,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub recommendation: String,
    pub current_value: Option<f64>,
    pub target_value: Option<f64>,
    pub effort: String,
    pub affected_platforms: Vec<String>,
    pub affected_categories: Vec<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInsight {
    pub category: String,
    pub priority: String,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub recommendation: String,
    pub current_value: Option<f64>,
    pub target_value: Option<f64>,
    pub effort: String,
    pub affected_platforms: Vec<String>,
    pub affected_categories: Vec<String>,
}

const INSIGHT_COLUMNS: &str = "id, public_id, brand_id, scan_id, category, priority, status, \
     title, description, impact, recommendation, current_value, target_value, effort, \
     affected_platforms, affected_categories, resolved_at, created_at, updated_at";

/// Inserts the insights produced by a scan in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails; the batch rolls back.
pub async fn insert_insights(
    pool: &PgPool,
    brand_id: i64,
    scan_id: Option<i64>,
    insights: &[NewInsight],
) -> Result<Vec<InsightRow>, DbError> {
    let mut tx = pool.begin().await?;
    let mut rows = Vec::with_capacity(insights.len());

    for insight in insights {
        let row = sqlx::query_as::<_, InsightRow>(&format!(
            "INSERT INTO perception_insights (public_id, brand_id, scan_id, category, priority, \
                 title, description, impact, recommendation, current_value, target_value, effort, \
                 affected_platforms, affected_categories) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {INSIGHT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(brand_id)
        .bind(scan_id)
        .bind(&insight.category)
        .bind(&insight.priority)
        .bind(&insight.title)
        .bind(&insight.description)
        .bind(&insight.impact)
        .bind(&insight.recommendation)
        .bind(insight.current_value)
        .bind(insight.target_value)
        .bind(&insight.effort)
        .bind(&insight.affected_platforms)
        .bind(&insight.affected_categories)
        .fetch_one(&mut *tx)
        .await?;
        rows.push(row);
    }

    tx.commit().await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_insight(pool: &PgPool, public_id: Uuid) -> Result<Option<InsightRow>, DbError> {
    let row = sqlx::query_as::<_, InsightRow>(&format!(
        "SELECT {INSIGHT_COLUMNS} FROM perception_insights WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no insight has this id.
pub async fn get_insight_by_id(pool: &PgPool, id: i64) -> Result<InsightRow, DbError> {
    sqlx::query_as::<_, InsightRow>(&format!(
        "SELECT {INSIGHT_COLUMNS} FROM perception_insights WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Insights for a brand, most urgent first, optionally narrowed by status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_insights_for_brand(
    pool: &PgPool,
    brand_id: i64,
    status: Option<&str>,
    limit: i64,
) -> Result<Vec<InsightRow>, DbError> {
    let rows = sqlx::query_as::<_, InsightRow>(&format!(
        "SELECT {INSIGHT_COLUMNS} FROM perception_insights \
         WHERE brand_id = $1 AND ($2::text IS NULL OR status = $2) \
         ORDER BY CASE priority \
                      WHEN 'critical' THEN 0 WHEN 'high' THEN 1 \
                      WHEN 'medium' THEN 2 ELSE 3 END, \
                  created_at DESC \
         LIMIT $3"
    ))
    .bind(brand_id)
    .bind(status)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_insights_for_scan(
    pool: &PgPool,
    scan_id: i64,
) -> Result<Vec<InsightRow>, DbError> {
    let rows = sqlx::query_as::<_, InsightRow>(&format!(
        "SELECT {INSIGHT_COLUMNS} FROM perception_insights WHERE scan_id = $1 ORDER BY id"
    ))
    .bind(scan_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Sets an insight's status; `resolved_at` is stamped on resolution and
/// cleared otherwise.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no insight has this id.
pub async fn update_insight_status(
    pool: &PgPool,
    id: i64,
    status: &str,
) -> Result<InsightRow, DbError> {
    sqlx::query_as::<_, InsightRow>(&format!(
        "UPDATE perception_insights SET status = $1, updated_at = NOW(), \
             resolved_at = CASE WHEN $1 = 'resolved' THEN NOW() ELSE NULL END \
         WHERE id = $2 \
         RETURNING {INSIGHT_COLUMNS}"
    ))
    .bind(status)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}
