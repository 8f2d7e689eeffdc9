//! Brand handlers: registry, profile, review queue, and analysis.

use aeo_db::{BrandProfileRow, BrandRow, DbError, NewBrand};
use aeo_profiler::{
    low_confidence_fields, save_profile, Brand360Profile, ProfilerError, ReviewItem,
    DEFAULT_REVIEW_THRESHOLD,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::scans::ScanItem;
use super::{map_db_error, resolve_brand, unavailable, ApiError, ApiResponse, AppState};

const MAX_NAME_LEN: usize = 200;

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CreateBrandRequest {
    pub name: String,
    pub domain: String,
    pub industry: Option<String>,
    #[serde(default)]
    pub review_sites: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(in crate::api) struct AnalyzeRequest {
    /// Defaults to `https://{domain}`.
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct ReviewQueueQuery {
    pub threshold: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct BrandItem {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub domain: String,
    pub industry: Option<String>,
    pub review_sites: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<BrandRow> for BrandItem {
    fn from(row: BrandRow) -> Self {
        Self {
            id: row.public_id,
            name: row.name,
            slug: row.slug,
            domain: row.domain,
            industry: row.industry,
            review_sites: row.review_sites,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct BrandDetail {
    #[serde(flatten)]
    pub brand: BrandItem,
    pub has_profile: bool,
    pub profile_confidence: Option<f64>,
    pub active_prompts: i64,
    pub total_scans: i64,
    pub latest_scan: Option<ScanItem>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ProfileItem {
    pub source_url: Option<String>,
    pub overall_confidence: Option<f64>,
    pub extracted_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    pub profile: serde_json::Value,
}

impl From<BrandProfileRow> for ProfileItem {
    fn from(row: BrandProfileRow) -> Self {
        Self {
            source_url: row.source_url,
            overall_confidence: row.overall_confidence,
            extracted_at: row.extracted_at,
            updated_at: row.updated_at,
            profile: row.profile,
        }
    }
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct AnalysisResponse {
    pub pages_crawled: usize,
    pub profile: ProfileItem,
    pub review_queue: Vec<ReviewItem>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn map_unique_violation(req_id: &str, e: &DbError) -> ApiError {
    if let DbError::Sqlx(sqlx::Error::Database(db_err)) = e {
        if db_err.code().as_deref() == Some("23505") {
            return ApiError::new(req_id, "conflict", "a brand with that slug already exists");
        }
    }
    map_db_error(req_id, e)
}

fn map_profiler_error(req_id: &str, e: &ProfilerError) -> ApiError {
    match e {
        ProfilerError::Db(db) => map_db_error(req_id, db),
        ProfilerError::Crawler(aeo_crawler::CrawlerError::InvalidUrl { .. })
        | ProfilerError::EmptyContent(_) => {
            ApiError::new(req_id, "validation_error", e.to_string())
        }
        ProfilerError::Llm(aeo_llm::LlmError::MissingApiKey(_)) => {
            ApiError::new(req_id, "service_unavailable", e.to_string())
        }
        _ => {
            tracing::error!(error = %e, "brand analysis failed");
            ApiError::new(req_id, "internal_error", e.to_string())
        }
    }
}

async fn load_profile(
    state: &AppState,
    req_id: &str,
    brand: &BrandRow,
) -> Result<BrandProfileRow, ApiError> {
    aeo_db::get_brand_profile(&state.pool, brand.id)
        .await
        .map_err(|e| map_db_error(req_id, &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id,
                "not_found",
                format!("brand '{}' has no profile yet", brand.slug),
            )
        })
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/brands
pub(in crate::api) async fn list_brands(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<BrandItem>>>, ApiError> {
    let rows = aeo_db::list_active_brands(&state.pool)
        .await
        .map_err(|e| map_db_error(&req_id.0, &e))?;
    Ok(ApiResponse::new(
        &req_id,
        rows.into_iter().map(BrandItem::from).collect(),
    ))
}

/// POST /api/v1/brands
pub(in crate::api) async fn create_brand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateBrandRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BrandItem>>), ApiError> {
    let rid = &req_id.0;

    let name = body.name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(ApiError::new(
            rid,
            "validation_error",
            format!("name must be 1-{MAX_NAME_LEN} characters"),
        ));
    }
    let domain = body.domain.trim().trim_end_matches('/');
    if domain.is_empty() || domain.contains(char::is_whitespace) {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "domain must be a bare host name such as 'acme.com'",
        ));
    }
    let slug = aeo_core::brands::slugify(name);
    if slug.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "name must contain at least one letter or digit",
        ));
    }

    let row = aeo_db::create_brand(
        &state.pool,
        &NewBrand {
            name,
            slug: &slug,
            domain,
            industry: body.industry.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            review_sites: &body.review_sites,
        },
    )
    .await
    .map_err(|e| map_unique_violation(rid, &e))?;

    tracing::info!(brand = %row.slug, "brand created");
    Ok((StatusCode::CREATED, ApiResponse::new(&req_id, row.into())))
}

/// GET /api/v1/brands/{slug}
pub(in crate::api) async fn get_brand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<BrandDetail>>, ApiError> {
    let rid = &req_id.0;
    let brand = resolve_brand(&state.pool, rid, &slug).await?;
    let db = |e: DbError| map_db_error(rid, &e);

    let profile = aeo_db::get_brand_profile(&state.pool, brand.id)
        .await
        .map_err(db)?;
    let active_prompts = aeo_db::count_active_prompts(&state.pool, brand.id)
        .await
        .map_err(db)?;
    let total_scans = aeo_db::count_scans_for_brand(&state.pool, brand.id)
        .await
        .map_err(db)?;
    let latest_scan = aeo_db::list_scans_for_brand(&state.pool, brand.id, 1)
        .await
        .map_err(db)?
        .into_iter()
        .next()
        .map(ScanItem::from);

    Ok(ApiResponse::new(
        &req_id,
        BrandDetail {
            has_profile: profile.is_some(),
            profile_confidence: profile.and_then(|p| p.overall_confidence),
            active_prompts,
            total_scans,
            latest_scan,
            brand: brand.into(),
        },
    ))
}

/// GET /api/v1/brands/{slug}/profile
pub(in crate::api) async fn get_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<ProfileItem>>, ApiError> {
    let brand = resolve_brand(&state.pool, &req_id.0, &slug).await?;
    let row = load_profile(&state, &req_id.0, &brand).await?;
    Ok(ApiResponse::new(&req_id, row.into()))
}

/// PUT /api/v1/brands/{slug}/profile
///
/// Replaces the profile and its competitor, product, persona and claim rows.
pub(in crate::api) async fn put_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Json(mut profile): Json<Brand360Profile>,
) -> Result<Json<ApiResponse<ProfileItem>>, ApiError> {
    let rid = &req_id.0;
    let brand = resolve_brand(&state.pool, rid, &slug).await?;

    profile.clamp_confidences();
    let row = save_profile(&state.pool, brand.id, &profile)
        .await
        .map_err(|e| map_profiler_error(rid, &e))?;
    Ok(ApiResponse::new(&req_id, row.into()))
}

/// GET /api/v1/brands/{slug}/review-queue
pub(in crate::api) async fn review_queue(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Query(query): Query<ReviewQueueQuery>,
) -> Result<Json<ApiResponse<Vec<ReviewItem>>>, ApiError> {
    let rid = &req_id.0;
    let brand = resolve_brand(&state.pool, rid, &slug).await?;
    let row = load_profile(&state, rid, &brand).await?;

    let profile: Brand360Profile = serde_json::from_value(row.profile).map_err(|e| {
        tracing::error!(brand = %brand.slug, error = %e, "stored profile does not decode");
        ApiError::new(rid, "internal_error", "stored profile is unreadable")
    })?;
    let threshold = query
        .threshold
        .unwrap_or(DEFAULT_REVIEW_THRESHOLD)
        .clamp(0.0, 1.0);

    Ok(ApiResponse::new(
        &req_id,
        low_confidence_fields(&profile, threshold),
    ))
}

/// POST /api/v1/brands/{slug}/analyze
///
/// Crawls the site, extracts a profile, and stores it.
pub(in crate::api) async fn analyze_brand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<ApiResponse<AnalysisResponse>>, ApiError> {
    let rid = &req_id.0;
    let brand = resolve_brand(&state.pool, rid, &slug).await?;
    let analyzer = state
        .services
        .analyzer
        .as_ref()
        .ok_or_else(|| unavailable(rid, "brand analysis"))?;

    let url = body
        .url
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| format!("https://{}", brand.domain));

    tracing::info!(brand = %brand.slug, url = %url, "analysis started");
    let crawl = analyzer
        .crawler
        .crawl_with_retry(&url, &analyzer.options)
        .await
        .map_err(|e| map_profiler_error(rid, &ProfilerError::from(e)))?;
    let profile = analyzer
        .extractor
        .extract_profile(&crawl)
        .await
        .map_err(|e| map_profiler_error(rid, &e))?;
    let row = save_profile(&state.pool, brand.id, &profile)
        .await
        .map_err(|e| map_profiler_error(rid, &e))?;

    Ok(ApiResponse::new(
        &req_id,
        AnalysisResponse {
            pages_crawled: crawl.page_count,
            review_queue: low_confidence_fields(&profile, DEFAULT_REVIEW_THRESHOLD),
            profile: row.into(),
        },
    ))
}
