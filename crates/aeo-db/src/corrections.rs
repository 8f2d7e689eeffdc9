//! Database operations for `correction_workflows`.
//!
//! Each transition locks the workflow row, checks the move against
//! [`CorrectionStatus::can_transition_to`], and updates the linked insight in
//! the same transaction.

use aeo_core::CorrectionStatus;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CorrectionRow {
    pub id: i64,
    pub public_id: Uuid,
    pub brand_id: i64,
    pub insight_id: Option<i64>,
    pub scan_id: Option<i64>,
    pub problem_type: String,
    pub priority: String,
    pub status: String,
    pub title: String,
    pub description: String,
    pub suggestions: serde_json::Value,
    pub approved_fixes: Vec<String>,
    pub pre_fix_score: Option<i32>,
    pub post_fix_score: Option<i32>,
    pub notes: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub implemented_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCorrection {
    pub brand_id: i64,
    pub insight_id: Option<i64>,
    pub scan_id: Option<i64>,
    pub problem_type: String,
    pub priority: String,
    pub title: String,
    pub description: String,
    pub suggestions: serde_json::Value,
    pub pre_fix_score: Option<i32>,
}

const CORRECTION_COLUMNS: &str = "id, public_id, brand_id, insight_id, scan_id, problem_type, \
     priority, status, title, description, suggestions, approved_fixes, pre_fix_score, \
     post_fix_score, notes, approved_at, implemented_at, verified_at, dismissed_at, \
     created_at, updated_at";

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

/// Creates a workflow in `suggested` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_correction(
    pool: &PgPool,
    correction: &NewCorrection,
) -> Result<CorrectionRow, DbError> {
    let row = sqlx::query_as::<_, CorrectionRow>(&format!(
        "INSERT INTO correction_workflows (public_id, brand_id, insight_id, scan_id, problem_type, \
             priority, status, title, description, suggestions, pre_fix_score) \
         VALUES ($1, $2, $3, $4, $5, $6, 'suggested', $7, $8, $9, $10) \
         RETURNING {CORRECTION_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(correction.brand_id)
    .bind(correction.insight_id)
    .bind(correction.scan_id)
    .bind(&correction.problem_type)
    .bind(&correction.priority)
    .bind(&correction.title)
    .bind(&correction.description)
    .bind(&correction.suggestions)
    .bind(correction.pre_fix_score)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_correction(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<CorrectionRow>, DbError> {
    let row = sqlx::query_as::<_, CorrectionRow>(&format!(
        "SELECT {CORRECTION_COLUMNS} FROM correction_workflows WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_corrections_for_brand(
    pool: &PgPool,
    brand_id: i64,
    status: Option<&str>,
    limit: i64,
) -> Result<Vec<CorrectionRow>, DbError> {
    let rows = sqlx::query_as::<_, CorrectionRow>(&format!(
        "SELECT {CORRECTION_COLUMNS} FROM correction_workflows \
         WHERE brand_id = $1 AND ($2::text IS NULL OR status = $2) \
         ORDER BY created_at DESC, id DESC LIMIT $3"
    ))
    .bind(brand_id)
    .bind(status)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

async fn lock_for_transition(
    tx: &mut Transaction<'_, Postgres>,
    public_id: Uuid,
    next: CorrectionStatus,
) -> Result<CorrectionRow, DbError> {
    let row = sqlx::query_as::<_, CorrectionRow>(&format!(
        "SELECT {CORRECTION_COLUMNS} FROM correction_workflows WHERE public_id = $1 FOR UPDATE"
    ))
    .bind(public_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(DbError::NotFound)?;

    let current: CorrectionStatus = row
        .status
        .parse()
        .map_err(|e: aeo_core::CoreError| DbError::InvalidStoredValue(e.to_string()))?;

    if !current.can_transition_to(next) {
        return Err(DbError::InvalidCorrectionTransition {
            public_id,
            from: row.status,
            to: next.as_str(),
        });
    }
    Ok(row)
}

async fn set_insight_status(
    tx: &mut Transaction<'_, Postgres>,
    insight_id: Option<i64>,
    status: &str,
) -> Result<(), DbError> {
    if let Some(insight_id) = insight_id {
        sqlx::query(
            "UPDATE perception_insights SET status = $1, updated_at = NOW(), \
                 resolved_at = CASE WHEN $1 = 'resolved' THEN NOW() ELSE resolved_at END \
             WHERE id = $2",
        )
        .bind(status)
        .bind(insight_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

/// `suggested -> approved`. `approved_fixes` records which suggested fix
/// types the reviewer accepted. The linked insight moves to `in_progress`.
///
/// # Errors
///
/// Returns [`DbError::InvalidCorrectionTransition`] if the workflow is not
/// `suggested`, or [`DbError::NotFound`].
pub async fn approve_correction(
    pool: &PgPool,
    public_id: Uuid,
    approved_fixes: &[String],
    notes: Option<&str>,
) -> Result<CorrectionRow, DbError> {
    let mut tx = pool.begin().await?;
    let current = lock_for_transition(&mut tx, public_id, CorrectionStatus::Approved).await?;

    let row = sqlx::query_as::<_, CorrectionRow>(&format!(
        "UPDATE correction_workflows SET status = 'approved', approved_at = NOW(), \
             approved_fixes = $1, notes = COALESCE($2, notes), updated_at = NOW() \
         WHERE id = $3 \
         RETURNING {CORRECTION_COLUMNS}"
    ))
    .bind(approved_fixes)
    .bind(notes)
    .bind(current.id)
    .fetch_one(&mut *tx)
    .await?;

    set_insight_status(&mut tx, current.insight_id, "in_progress").await?;
    tx.commit().await?;
    Ok(row)
}

/// `approved -> implemented`.
///
/// # Errors
///
/// Returns [`DbError::InvalidCorrectionTransition`] if the workflow is not
/// `approved`, or [`DbError::NotFound`].
pub async fn implement_correction(
    pool: &PgPool,
    public_id: Uuid,
    notes: Option<&str>,
) -> Result<CorrectionRow, DbError> {
    let mut tx = pool.begin().await?;
    let current = lock_for_transition(&mut tx, public_id, CorrectionStatus::Implemented).await?;

    let row = sqlx::query_as::<_, CorrectionRow>(&format!(
        "UPDATE correction_workflows SET status = 'implemented', implemented_at = NOW(), \
             notes = COALESCE($1, notes), updated_at = NOW() \
         WHERE id = $2 \
         RETURNING {CORRECTION_COLUMNS}"
    ))
    .bind(notes)
    .bind(current.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// `approved | implemented -> verified`, recording the score measured after
/// the fix. The linked insight becomes `resolved`.
///
/// # Errors
///
/// Returns [`DbError::InvalidCorrectionTransition`] from any other status,
/// or [`DbError::NotFound`].
pub async fn verify_correction(
    pool: &PgPool,
    public_id: Uuid,
    post_fix_score: Option<i32>,
) -> Result<CorrectionRow, DbError> {
    let mut tx = pool.begin().await?;
    let current = lock_for_transition(&mut tx, public_id, CorrectionStatus::Verified).await?;

    let row = sqlx::query_as::<_, CorrectionRow>(&format!(
        "UPDATE correction_workflows SET status = 'verified', verified_at = NOW(), \
             post_fix_score = $1, updated_at = NOW() \
         WHERE id = $2 \
         RETURNING {CORRECTION_COLUMNS}"
    ))
    .bind(post_fix_score)
    .bind(current.id)
    .fetch_one(&mut *tx)
    .await?;

    set_insight_status(&mut tx, current.insight_id, "resolved").await?;
    tx.commit().await?;
    Ok(row)
}

/// Dismisses any workflow that has not been verified.
///
/// # Errors
///
/// Returns [`DbError::InvalidCorrectionTransition`] for verified or already
/// dismissed workflows, or [`DbError::NotFound`].
pub async fn dismiss_correction(
    pool: &PgPool,
    public_id: Uuid,
    reason: Option<&str>,
) -> Result<CorrectionRow, DbError> {
    let mut tx = pool.begin().await?;
    let current = lock_for_transition(&mut tx, public_id, CorrectionStatus::Dismissed).await?;

    let row = sqlx::query_as::<_, CorrectionRow>(&format!(
        "UPDATE correction_workflows SET status = 'dismissed', dismissed_at = NOW(), \
             notes = COALESCE($1, notes), updated_at = NOW() \
         WHERE id = $2 \
         RETURNING {CORRECTION_COLUMNS}"
    ))
    .bind(reason)
    .bind(current.id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}
