//! Scan handlers. Scans run in the background; clients poll
//! `GET /api/v1/scans/{id}` for progress.

use aeo_core::{Platform, PromptCategory};
use aeo_db::{ScanRow, ScoredResultRow};
use aeo_perception::{compare_for_brand, ScanComparison, ScanOptions};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_db_error, map_perception_error, normalize_limit, parse_field, parse_public_id,
    resolve_brand, unavailable, ApiError, ApiResponse, AppState,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(in crate::api) struct StartScanRequest {
    pub platforms: Vec<String>,
    pub categories: Vec<String>,
    pub prompt_ids: Vec<i64>,
    pub max_prompts: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(in crate::api) struct CompareRequest {
    pub earlier_scan_id: Option<String>,
    pub later_scan_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct ScanListQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ScanItem {
    pub id: Uuid,
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

impl From<ScanRow> for ScanItem {
    fn from(row: ScanRow) -> Self {
        Self {
            id: row.public_id,
            status: row.status,
            trigger_source: row.trigger_source,
            platforms: row.platforms,
            prompt_count: row.prompt_count,
            completed_count: row.completed_count,
            overall_score: row.overall_score,
            quadrant: row.quadrant,
            metrics: row.metrics,
            platform_scores: row.platform_scores,
            category_scores: row.category_scores,
            error_message: row.error_message,
            started_at: row.started_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct ResultItem {
    pub id: i64,
    pub prompt_id: i64,
    pub platform: String,
    pub category: String,
    pub prompt_text: String,
    pub response: String,
    pub model: String,
    pub faithfulness_score: f64,
    pub share_of_voice: f64,
    pub brand_mentioned: bool,
    pub brand_position: Option<i32>,
    pub competitors_mentioned: serde_json::Value,
    pub sentiment_score: f64,
    pub sentiment_label: String,
    pub voice_alignment_score: f64,
    pub hallucination_score: f64,
    pub hallucination_detected: bool,
    pub overall_score: i32,
    pub created_at: DateTime<Utc>,
}

impl From<ScoredResultRow> for ResultItem {
    fn from(row: ScoredResultRow) -> Self {
        Self {
            id: row.id,
            prompt_id: row.prompt_id,
            platform: row.platform,
            category: row.category,
            prompt_text: row.prompt_text,
            response: row.response,
            model: row.model,
            faithfulness_score: row.faithfulness_score,
            share_of_voice: row.share_of_voice,
            brand_mentioned: row.brand_mentioned,
            brand_position: row.brand_position,
            competitors_mentioned: row.competitors_mentioned,
            sentiment_score: row.sentiment_score,
            sentiment_label: row.sentiment_label,
            voice_alignment_score: row.voice_alignment_score,
            hallucination_score: row.hallucination_score,
            hallucination_detected: row.hallucination_detected,
            overall_score: row.overall_score,
            created_at: row.created_at,
        }
    }
}

async fn load_scan(state: &AppState, req_id: &str, raw_id: &str) -> Result<ScanRow, ApiError> {
    let public_id = parse_public_id(req_id, raw_id)?;
    aeo_db::get_scan(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id, &e))?
        .ok_or_else(|| ApiError::new(req_id, "not_found", format!("scan {public_id} not found")))
}

/// POST /api/v1/brands/{slug}/scans
///
/// Records a pending scan and runs it in the background. Responds 202 with the pending scan.
pub(in crate::api) async fn start_scan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Json(body): Json<StartScanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ScanItem>>), ApiError> {
    let rid = &req_id.0;
    let brand = resolve_brand(&state.pool, rid, &slug).await?;
    let orchestrator = state
        .services
        .scans
        .as_ref()
        .ok_or_else(|| unavailable(rid, "scanning"))?;

    let mut options = ScanOptions {
        prompt_ids: body.prompt_ids,
        max_prompts: body.max_prompts.filter(|n| *n > 0),
        ..ScanOptions::default()
    };
    if !body.platforms.is_empty() {
        let mut platforms: Vec<Platform> = Vec::with_capacity(body.platforms.len());
        for raw in &body.platforms {
            let platform = parse_field::<Platform>(rid, "platforms", raw.trim())?;
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }
        options.platforms = platforms;
    }
    options.categories = body
        .categories
        .iter()
        .map(|c| parse_field::<PromptCategory>(rid, "categories", c))
        .collect::<Result<_, _>>()?;

    let prepared = orchestrator
        .prepare(&brand, &options)
        .await
        .map_err(|e| map_perception_error(rid, &e))?;
    let item = ScanItem::from(prepared.scan.clone());

    let services = state.services.clone();
    let brand_slug = brand.slug.clone();
    tokio::spawn(async move {
        let Some(orchestrator) = services.scans.as_ref() else {
            return;
        };
        if let Err(e) = orchestrator.execute(prepared).await {
            tracing::error!(brand = %brand_slug, error = %e, "background scan failed");
        }
    });

    Ok((StatusCode::ACCEPTED, ApiResponse::new(&req_id, item)))
}

/// GET /api/v1/brands/{slug}/scans
pub(in crate::api) async fn list_scans(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Query(query): Query<ScanListQuery>,
) -> Result<Json<ApiResponse<Vec<ScanItem>>>, ApiError> {
    let rid = &req_id.0;
    let brand = resolve_brand(&state.pool, rid, &slug).await?;
    let rows = aeo_db::list_scans_for_brand(&state.pool, brand.id, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(rid, &e))?;
    Ok(ApiResponse::new(
        &req_id,
        rows.into_iter().map(ScanItem::from).collect(),
    ))
}

/// GET /api/v1/scans/{id}
pub(in crate::api) async fn get_scan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ScanItem>>, ApiError> {
    let scan = load_scan(&state, &req_id.0, &id).await?;
    Ok(ApiResponse::new(&req_id, scan.into()))
}

/// GET /api/v1/scans/{id}/results
pub(in crate::api) async fn list_results(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ResultItem>>>, ApiError> {
    let rid = &req_id.0;
    let scan = load_scan(&state, rid, &id).await?;
    let rows = aeo_db::list_results_for_scan(&state.pool, scan.id)
        .await
        .map_err(|e| map_db_error(rid, &e))?;
    Ok(ApiResponse::new(
        &req_id,
        rows.into_iter().map(ResultItem::from).collect(),
    ))
}

/// POST /api/v1/brands/{slug}/scans/compare
///
/// Compares two scans, or the two most recent completed scans when no ids are given.
pub(in crate::api) async fn compare_scans(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Json(body): Json<CompareRequest>,
) -> Result<Json<ApiResponse<ScanComparison>>, ApiError> {
    let rid = &req_id.0;
    let brand = resolve_brand(&state.pool, rid, &slug).await?;

    let scan_ids = match (body.earlier_scan_id.as_deref(), body.later_scan_id.as_deref()) {
        (Some(earlier), Some(later)) => Some((
            parse_public_id(rid, earlier)?,
            parse_public_id(rid, later)?,
        )),
        (None, None) => None,
        _ => {
            return Err(ApiError::new(
                rid,
                "validation_error",
                "earlier_scan_id and later_scan_id must be given together",
            ))
        }
    };

    let comparison = compare_for_brand(&state.pool, brand.id, scan_ids)
        .await
        .map_err(|e| map_perception_error(rid, &e))?;
    Ok(ApiResponse::new(&req_id, comparison))
}
