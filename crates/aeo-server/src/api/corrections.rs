//! Correction workflow handlers.
//!
//! A correction is generated from an insight and then walks
//! `suggested -> approved -> implemented -> verified`, or is dismissed from
//! any non-terminal state. Transition rules live in `aeo-db`; an illegal move
//! surfaces here as 409.

use aeo_core::{CorrectionStatus, FixType};
use aeo_db::CorrectionRow;
use aeo_perception::{BrandKnowledge, CorrectionPlan, InsightBrief};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::insights::load_insight;
use super::{
    map_db_error, map_perception_error, normalize_limit, parse_field, parse_public_id,
    resolve_brand, unavailable, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CorrectionListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(in crate::api) struct ApproveRequest {
    pub approved_fixes: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(in crate::api) struct NotesRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(in crate::api) struct VerifyRequest {
    /// Defaults to the overall score of the brand's latest completed scan.
    pub post_fix_score: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(in crate::api) struct DismissRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct CorrectionItem {
    pub id: Uuid,
    pub problem_type: String,
    pub priority: String,
    pub status: String,
    pub title: String,
    pub description: String,
    pub suggestions: serde_json::Value,
    pub approved_fixes: Vec<String>,
    pub pre_fix_score: Option<i32>,
    pub post_fix_score: Option<i32>,
    pub score_change: Option<i32>,
    pub notes: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub implemented_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CorrectionRow> for CorrectionItem {
    fn from(row: CorrectionRow) -> Self {
        let score_change = row
            .pre_fix_score
            .zip(row.post_fix_score)
            .map(|(pre, post)| post - pre);
        Self {
            id: row.public_id,
            problem_type: row.problem_type,
            priority: row.priority,
            status: row.status,
            title: row.title,
            description: row.description,
            suggestions: row.suggestions,
            approved_fixes: row.approved_fixes,
            pre_fix_score: row.pre_fix_score,
            post_fix_score: row.post_fix_score,
            score_change,
            notes: row.notes,
            approved_at: row.approved_at,
            implemented_at: row.implemented_at,
            verified_at: row.verified_at,
            dismissed_at: row.dismissed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct GeneratedCorrection {
    pub correction: CorrectionItem,
    pub plan: CorrectionPlan,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

async fn latest_score(
    state: &AppState,
    req_id: &str,
    brand_id: i64,
) -> Result<Option<i32>, ApiError> {
    let scans = aeo_db::latest_completed_scans(&state.pool, brand_id, 1)
        .await
        .map_err(|e| map_db_error(req_id, &e))?;
    Ok(scans.first().and_then(|s| s.overall_score))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/insights/{id}/corrections
pub(in crate::api) async fn create_correction(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<GeneratedCorrection>>), ApiError> {
    let rid = &req_id.0;
    let generator = state
        .services
        .corrections
        .as_ref()
        .ok_or_else(|| unavailable(rid, "correction generation"))?;

    let insight = load_insight(&state, rid, &id).await?;
    let brand = aeo_db::get_brand_by_id(&state.pool, insight.brand_id)
        .await
        .map_err(|e| map_db_error(rid, &e))?;
    let knowledge = BrandKnowledge::load(&state.pool, brand)
        .await
        .map_err(|e| map_db_error(rid, &e))?;
    let brief = InsightBrief::from_row(&insight).map_err(|e| map_perception_error(rid, &e))?;

    let plan = generator.generate(&brief, &knowledge.ground_truth()).await;
    let pre_fix_score = latest_score(&state, rid, insight.brand_id).await?;
    let new = plan
        .to_new_correction(&insight, pre_fix_score)
        .map_err(|e| map_perception_error(rid, &e))?;
    let row = aeo_db::create_correction(&state.pool, &new)
        .await
        .map_err(|e| map_db_error(rid, &e))?;

    tracing::info!(
        correction = %row.public_id,
        insight = %insight.public_id,
        suggestions = plan.suggestions.len(),
        "correction generated"
    );
    Ok((
        StatusCode::CREATED,
        ApiResponse::new(
            &req_id,
            GeneratedCorrection {
                correction: row.into(),
                plan,
            },
        ),
    ))
}

/// GET /api/v1/brands/{slug}/corrections
pub(in crate::api) async fn list_corrections(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Query(query): Query<CorrectionListQuery>,
) -> Result<Json<ApiResponse<Vec<CorrectionItem>>>, ApiError> {
    let rid = &req_id.0;
    let brand = resolve_brand(&state.pool, rid, &slug).await?;
    let status = query
        .status
        .as_deref()
        .map(|raw| parse_field::<CorrectionStatus>(rid, "status", raw))
        .transpose()?;

    let rows = aeo_db::list_corrections_for_brand(
        &state.pool,
        brand.id,
        status.map(CorrectionStatus::as_str),
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(rid, &e))?;
    Ok(ApiResponse::new(
        &req_id,
        rows.into_iter().map(CorrectionItem::from).collect(),
    ))
}

/// GET /api/v1/corrections/{id}
pub(in crate::api) async fn get_correction(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<CorrectionItem>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_public_id(rid, &id)?;
    let row = aeo_db::get_correction(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(rid, &e))?
        .ok_or_else(|| {
            ApiError::new(rid, "not_found", format!("correction {public_id} not found"))
        })?;
    Ok(ApiResponse::new(&req_id, row.into()))
}

/// POST /api/v1/corrections/{id}/approve
pub(in crate::api) async fn approve_correction(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<ApproveRequest>,
) -> Result<Json<ApiResponse<CorrectionItem>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_public_id(rid, &id)?;

    let mut fixes = Vec::with_capacity(body.approved_fixes.len());
    for raw in &body.approved_fixes {
        let fix = parse_field::<FixType>(rid, "approved_fixes", raw.trim())?;
        if !fixes.contains(&fix) {
            fixes.push(fix);
        }
    }
    let fixes: Vec<String> = fixes.iter().map(ToString::to_string).collect();

    let row = aeo_db::approve_correction(
        &state.pool,
        public_id,
        &fixes,
        trimmed(body.notes.as_deref()),
    )
    .await
    .map_err(|e| map_db_error(rid, &e))?;
    tracing::info!(correction = %public_id, fixes = fixes.len(), "correction approved");
    Ok(ApiResponse::new(&req_id, row.into()))
}

/// POST /api/v1/corrections/{id}/implement
pub(in crate::api) async fn implement_correction(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<NotesRequest>,
) -> Result<Json<ApiResponse<CorrectionItem>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_public_id(rid, &id)?;
    let row = aeo_db::implement_correction(&state.pool, public_id, trimmed(body.notes.as_deref()))
        .await
        .map_err(|e| map_db_error(rid, &e))?;
    tracing::info!(correction = %public_id, "correction implemented");
    Ok(ApiResponse::new(&req_id, row.into()))
}

/// POST /api/v1/corrections/{id}/verify
pub(in crate::api) async fn verify_correction(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<ApiResponse<CorrectionItem>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_public_id(rid, &id)?;

    let post_fix_score = match body.post_fix_score {
        Some(score) => Some(score.clamp(0, 100)),
        None => {
            let current = aeo_db::get_correction(&state.pool, public_id)
                .await
                .map_err(|e| map_db_error(rid, &e))?
                .ok_or_else(|| {
                    ApiError::new(rid, "not_found", format!("correction {public_id} not found"))
                })?;
            latest_score(&state, rid, current.brand_id).await?
        }
    };

    let row = aeo_db::verify_correction(&state.pool, public_id, post_fix_score)
        .await
        .map_err(|e| map_db_error(rid, &e))?;
    tracing::info!(
        correction = %public_id,
        pre = ?row.pre_fix_score,
        post = ?row.post_fix_score,
        "correction verified"
    );
    Ok(ApiResponse::new(&req_id, row.into()))
}

/// POST /api/v1/corrections/{id}/dismiss
pub(in crate::api) async fn dismiss_correction(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<DismissRequest>,
) -> Result<Json<ApiResponse<CorrectionItem>>, ApiError> {
    let rid = &req_id.0;
    let public_id = parse_public_id(rid, &id)?;
    let row = aeo_db::dismiss_correction(&state.pool, public_id, trimmed(body.reason.as_deref()))
        .await
        .map_err(|e| map_db_error(rid, &e))?;
    tracing::info!(correction = %public_id, "correction dismissed");
    Ok(ApiResponse::new(&req_id, row.into()))
}
