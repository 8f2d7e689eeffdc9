use aeo_perception::{load_summary, DateRange, SummaryReport};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{map_perception_error, resolve_brand, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct SummaryQuery {
    /// `7d`, `30d` (default), `90d` or `all`.
    pub range: Option<String>,
}

/// GET /api/v1/brands/{slug}/reports/summary
pub(in crate::api) async fn summary_report(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<ApiResponse<SummaryReport>>, ApiError> {
    let rid = &req_id.0;
    let brand = resolve_brand(&state.pool, rid, &slug).await?;
    let range = match query.range.as_deref() {
        Some(raw) => raw.parse::<DateRange>().map_err(|_| {
            ApiError::new(
                rid,
                "validation_error",
                format!("range must be one of 7d, 30d, 90d, all (got '{raw}')"),
            )
        })?,
        None => DateRange::default(),
    };

    let report = load_summary(&state.pool, brand.id, range)
        .await
        .map_err(|e| map_perception_error(rid, &e))?;
    Ok(ApiResponse::new(&req_id, report))
}
