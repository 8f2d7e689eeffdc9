use aeo_core::AppConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};
use thiserror::Error;
use uuid::Uuid;

const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_MIN_CONNECTIONS: u32 = 1;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

// Resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            min_connections: DEFAULT_MIN_CONNECTIONS,
            acquire_timeout_secs: DEFAULT_ACQUIRE_TIMEOUT_SECS,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            max_connections: read_u32("AEO_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS),
            min_connections: read_u32("AEO_DB_MIN_CONNECTIONS", DEFAULT_MIN_CONNECTIONS),
            acquire_timeout_secs: read_u64(
                "AEO_DB_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_ACQUIRE_TIMEOUT_SECS,
            ),
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("DATABASE_URL is not set")]
    MissingDatabaseUrl,
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("scan {id} is not in '{expected_status}' status")]
    InvalidScanTransition {
        id: i64,
        expected_status: &'static str,
    },
    #[error("correction {public_id} cannot move from '{from}' to '{to}'")]
    InvalidCorrectionTransition {
        public_id: Uuid,
        from: String,
        to: &'static str,
    },
    #[error("stored value is invalid: {0}")]
    InvalidStoredValue(String),
}

/// Connect to a Postgres pool using explicit URL and config.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the connection cannot be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Connect to a Postgres pool, reading `DATABASE_URL` and pool settings from env.
///
/// # Errors
///
/// Returns [`DbError::MissingDatabaseUrl`] if `DATABASE_URL` is unset, or
/// [`DbError::Sqlx`] if the connection cannot be established.
pub async fn connect_pool_from_env() -> Result<PgPool, DbError> {
    let database_url = env::var("DATABASE_URL").map_err(|_| DbError::MissingDatabaseUrl)?;
    connect_pool(&database_url, PoolConfig::from_env())
        .await
        .map_err(DbError::from)
}

/// Run all pending migrations and return how many were applied.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    // _sqlx_migrations does not exist on a fresh database; count that as zero.
    let applied_before = count_applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let applied_after = count_applied_migrations(pool).await;

    let delta = (applied_after - applied_before).max(0);
    Ok(usize::try_from(delta).unwrap_or(0))
}

async fn count_applied_migrations(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true")
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Send a `SELECT 1` to verify the pool has a live connection.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}

/// Ping the pool and return a typed error on failure.
///
/// # Errors
///
/// Returns [`DbError`] if the ping fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    ping(pool).await?;
    Ok(())
}

fn read_u32(var: &str, default: u32) -> u32 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(default)
}

fn read_u64(var: &str, default: u64) -> u64 {
    env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}


pub mod brand_profiles;
pub mod brands;
pub mod corrections;
pub mod insights;
pub mod prompts;
pub mod results;
pub mod scans;
pub mod seed;

pub use brand_profiles::{
    get_brand_profile, list_brand_claims, list_brand_competitors, list_brand_personas,
    list_brand_products, save_brand_profile, upsert_brand_profile, BrandClaimRow,
    BrandCompetitorRow, BrandPersonaRow, BrandProductRow, BrandProfileRow, BrandRelations,
    NewBrandClaim, NewBrandCompetitor, NewBrandPersona, NewBrandProduct, NewBrandProfile,
};
pub use brands::{
    create_brand, get_brand_by_id, get_brand_by_slug, list_active_brands,
    list_brands_with_profiles, BrandRow, NewBrand,
};
pub use corrections::{
    approve_correction, create_correction, dismiss_correction, get_correction,
    implement_correction, list_corrections_for_brand, verify_correction, CorrectionRow,
    NewCorrection,
};
pub use insights::{
    get_insight, get_insight_by_id, insert_insights, list_insights_for_brand,
    list_insights_for_scan, update_insight_status, InsightRow, NewInsight,
};
pub use prompts::{
    count_active_prompts, deactivate_prompt, list_active_prompts, prompt_hash, upsert_prompts,
    NewPrompt, PromptRow,
};
pub use results::{insert_result, list_results_for_scan, NewResult, ResultRow, ScoredResultRow};
pub use scans::{
    complete_scan, count_scans_for_brand, create_scan, fail_interrupted_scans, fail_scan, get_scan,
    get_scan_by_id,
    increment_scan_progress, latest_completed_scans, list_scans_for_brand, start_scan,
    ScanCompletion, ScanRow,
};
pub use seed::seed_brands;
