use aeo_core::InsightStatus;
use aeo_db::InsightRow;
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{
    map_db_error, normalize_limit, parse_field, parse_public_id, resolve_brand, ApiError,
    ApiResponse, AppState,
};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct InsightListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct UpdateInsightRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct InsightItem {
    pub id: Uuid,
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

impl From<InsightRow> for InsightItem {
    fn from(row: InsightRow) -> Self {
        Self {
            id: row.public_id,
            category: row.category,
            priority: row.priority,
            status: row.status,
            title: row.title,
            description: row.description,
            impact: row.impact,
            recommendation: row.recommendation,
            current_value: row.current_value,
            target_value: row.target_value,
            effort: row.effort,
            affected_platforms: row.affected_platforms,
            affected_categories: row.affected_categories,
            resolved_at: row.resolved_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(in crate::api) async fn load_insight(
    state: &AppState,
    req_id: &str,
    raw_id: &str,
) -> Result<InsightRow, ApiError> {
    let public_id = parse_public_id(req_id, raw_id)?;
    aeo_db::get_insight(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id, &e))?
        .ok_or_else(|| {
            ApiError::new(req_id, "not_found", format!("insight {public_id} not found"))
        })
}

async fn set_status(
    state: &AppState,
    req_id: &str,
    raw_id: &str,
    status: InsightStatus,
) -> Result<InsightRow, ApiError> {
    let insight = load_insight(state, req_id, raw_id).await?;
    let updated = aeo_db::update_insight_status(&state.pool, insight.id, status.as_str())
        .await
        .map_err(|e| map_db_error(req_id, &e))?;
    tracing::info!(
        insight = %updated.public_id,
        from = %insight.status,
        to = %updated.status,
        "insight status changed"
    );
    Ok(updated)
}

/// GET /api/v1/brands/{slug}/insights
pub(in crate::api) async fn list_insights(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Query(query): Query<InsightListQuery>,
) -> Result<Json<ApiResponse<Vec<InsightItem>>>, ApiError> {
    let rid = &req_id.0;
    let brand = resolve_brand(&state.pool, rid, &slug).await?;
    let status = query
        .status
        .as_deref()
        .map(|raw| parse_field::<InsightStatus>(rid, "status", raw))
        .transpose()?;

    let rows = aeo_db::list_insights_for_brand(
        &state.pool,
        brand.id,
        status.map(InsightStatus::as_str),
        normalize_limit(query.limit),
    )
    .await
    .map_err(|e| map_db_error(rid, &e))?;
    Ok(ApiResponse::new(
        &req_id,
        rows.into_iter().map(InsightItem::from).collect(),
    ))
}

/// PATCH /api/v1/insights/{id}
pub(in crate::api) async fn update_insight(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<UpdateInsightRequest>,
) -> Result<Json<ApiResponse<InsightItem>>, ApiError> {
    let status = parse_field::<InsightStatus>(&req_id.0, "status", body.status.trim())?;
    let row = set_status(&state, &req_id.0, &id, status).await?;
    Ok(ApiResponse::new(&req_id, row.into()))
}

/// POST /api/v1/insights/{id}/dismiss
pub(in crate::api) async fn dismiss_insight(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<InsightItem>>, ApiError> {
    let row = set_status(&state, &req_id.0, &id, InsightStatus::Dismissed).await?;
    Ok(ApiResponse::new(&req_id, row.into()))
}
