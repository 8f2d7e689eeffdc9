//! Database operations for `perception_scans`.
//!
//! Status moves `pending -> running -> completed | failed`; every transition
//! is a guarded `UPDATE ... WHERE status = ...` so concurrent writers cannot
//! skip a state.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `perception_scans` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanRow {
    pub id: i64,
    pub public_id: Uuid,
    pub brand_id: i64,
    pub status: String,
    pub trigger_source: String,
    pub platforms: Vec<String>,
    pub prompt_count: i32,
    pub completed_count: i32,
    pub overall_score: Option<i32>,
    pub quadrant: Option<String>,
    pub metrics: Option<serde_json::Value>,
    pub platform_scores: Option<serde_json::Value>,
    pub category_scores: Option<serde_json::Value>,
    pub error_message: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Aggregates written when a scan completes.
#[derive(Debug, Clone)]
pub struct ScanCompletion {
    pub overall_score: i32,
    pub quadrant: String,
    pub metrics: serde_json::Value,
    pub platform_scores: serde_json::Value,
    pub category_scores: serde_json::Value,
}

const SCAN_COLUMNS: &str = "id, public_id, brand_id, status, trigger_source, platforms, \
     prompt_count, completed_count, overall_score, quadrant, metrics, platform_scores, \
     category_scores, error_message, started_at, completed_at, created_at";

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Creates a scan in `pending` status.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_scan(
    pool: &PgPool,
    brand_id: i64,
    platforms: &[String],
    prompt_count: i32,
    trigger_source: &str,
) -> Result<ScanRow, DbError> {
    let row = sqlx::query_as::<_, ScanRow>(&format!(
        "INSERT INTO perception_scans (public_id, brand_id, status, trigger_source, platforms, prompt_count) \
         VALUES ($1, $2, 'pending', $3, $4, $5) \
         RETURNING {SCAN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(brand_id)
    .bind(trigger_source)
    .bind(platforms)
    .bind(prompt_count)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Moves a `pending` scan to `running` and stamps `started_at`.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanTransition`] if the scan is not pending.
pub async fn start_scan(pool: &PgPool, id: i64) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE perception_scans SET status = 'running', started_at = NOW() \
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanTransition {
            id,
            expected_status: "pending",
        });
    }
    Ok(())
}

/// Bumps `completed_count` by one for a running scan.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanTransition`] if the scan is not running.
pub async fn increment_scan_progress(pool: &PgPool, id: i64) -> Result<i32, DbError> {
    let count = sqlx::query_scalar::<_, i32>(
        "UPDATE perception_scans SET completed_count = completed_count + 1 \
         WHERE id = $1 AND status = 'running' \
         RETURNING completed_count",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    count.ok_or(DbError::InvalidScanTransition {
        id,
        expected_status: "running",
    })
}

/// Moves a `running` scan to `completed` with its aggregate scores.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanTransition`] if the scan is not running.
pub async fn complete_scan(
    pool: &PgPool,
    id: i64,
    completion: &ScanCompletion,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE perception_scans SET status = 'completed', completed_at = NOW(), \
             overall_score = $1, quadrant = $2, metrics = $3, platform_scores = $4, \
             category_scores = $5 \
         WHERE id = $6 AND status = 'running'",
    )
    .bind(completion.overall_score)
    .bind(&completion.quadrant)
    .bind(&completion.metrics)
    .bind(&completion.platform_scores)
    .bind(&completion.category_scores)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanTransition {
            id,
            expected_status: "running",
        });
    }
    Ok(())
}

/// Marks a `pending` or `running` scan as `failed` with a message.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanTransition`] if the scan already finished.
pub async fn fail_scan(pool: &PgPool, id: i64, error_message: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE perception_scans SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status IN ('pending', 'running')",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidScanTransition {
            id,
            expected_status: "pending or running",
        });
    }
    Ok(())
}

/// Fails every scan still `pending` or `running`. Run at startup: scans run
/// in-process, so any left unfinished were interrupted by a restart.
///
/// Returns the number of scans failed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the update fails.
pub async fn fail_interrupted_scans(pool: &PgPool, error_message: &str) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE perception_scans SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE status IN ('pending', 'running')",
    )
    .bind(error_message)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_scan(pool: &PgPool, public_id: Uuid) -> Result<Option<ScanRow>, DbError> {
    let row = sqlx::query_as::<_, ScanRow>(&format!(
        "SELECT {SCAN_COLUMNS} FROM perception_scans WHERE public_id = $1"
    ))
    .bind(public_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no scan has this id.
pub async fn get_scan_by_id(pool: &PgPool, id: i64) -> Result<ScanRow, DbError> {
    sqlx::query_as::<_, ScanRow>(&format!(
        "SELECT {SCAN_COLUMNS} FROM perception_scans WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Most recent scans for a brand, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scans_for_brand(
    pool: &PgPool,
    brand_id: i64,
    limit: i64,
) -> Result<Vec<ScanRow>, DbError> {
    let rows = sqlx::query_as::<_, ScanRow>(&format!(
        "SELECT {SCAN_COLUMNS} FROM perception_scans WHERE brand_id = $1 \
         ORDER BY created_at DESC, id DESC LIMIT $2"
    ))
    .bind(brand_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// The `limit` most recently completed scans for a brand, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn latest_completed_scans(
    pool: &PgPool,
    brand_id: i64,
    limit: i64,
) -> Result<Vec<ScanRow>, DbError> {
    let rows = sqlx::query_as::<_, ScanRow>(&format!(
        "SELECT {SCAN_COLUMNS} FROM perception_scans \
         WHERE brand_id = $1 AND status = 'completed' \
         ORDER BY completed_at DESC, id DESC LIMIT $2"
    ))
    .bind(brand_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_scans_for_brand(pool: &PgPool, brand_id: i64) -> Result<i64, DbError> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM perception_scans WHERE brand_id = $1")
            .bind(brand_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}
