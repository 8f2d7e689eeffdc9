use aeo_core::PromptCategory;
use aeo_db::PromptRow;
use aeo_perception::{generate_and_store, BrandKnowledge};
use aeo_prompts::{GenerationResult, GeneratorOptions};
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_db_error, map_perception_error, parse_field, resolve_brand, ApiError, ApiResponse,
    AppState,
};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct PromptListQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct PromptItem {
    pub id: i64,
    pub template_id: String,
    pub category: String,
    pub intent: String,
    pub prompt_text: String,
    pub priority: i32,
    pub expected_themes: Vec<String>,
    pub is_hallucination_test: bool,
    pub target_persona: Option<String>,
    pub target_competitor: Option<String>,
    pub target_product: Option<String>,
}

impl From<PromptRow> for PromptItem {
    fn from(row: PromptRow) -> Self {
        Self {
            id: row.id,
            template_id: row.template_id,
            category: row.category,
            intent: row.intent,
            prompt_text: row.prompt_text,
            priority: row.priority,
            expected_themes: row.expected_themes,
            is_hallucination_test: row.is_hallucination_test,
            target_persona: row.target_persona,
            target_competitor: row.target_competitor,
            target_product: row.target_product,
        }
    }
}

/// GET /api/v1/brands/{slug}/prompts
pub(in crate::api) async fn list_prompts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Query(query): Query<PromptListQuery>,
) -> Result<Json<ApiResponse<Vec<PromptItem>>>, ApiError> {
    let rid = &req_id.0;
    let brand = resolve_brand(&state.pool, rid, &slug).await?;

    let categories = match query.category.as_deref() {
        Some(raw) => vec![parse_field::<PromptCategory>(rid, "category", raw)?
            .as_str()
            .to_string()],
        None => Vec::new(),
    };

    let rows = aeo_db::list_active_prompts(&state.pool, brand.id, &categories)
        .await
        .map_err(|e| map_db_error(rid, &e))?;
    Ok(ApiResponse::new(
        &req_id,
        rows.into_iter().map(PromptItem::from).collect(),
    ))
}

/// POST /api/v1/brands/{slug}/prompts/generate
pub(in crate::api) async fn generate_prompts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(slug): Path<String>,
    Json(mut options): Json<GeneratorOptions>,
) -> Result<Json<ApiResponse<GenerationResult>>, ApiError> {
    let rid = &req_id.0;
    let brand = resolve_brand(&state.pool, rid, &slug).await?;

    if options.categories.is_empty() {
        options.categories = PromptCategory::ALL.to_vec();
    }
    if options.review_sites.is_empty() {
        options.review_sites.clone_from(&brand.review_sites);
    }

    let knowledge = BrandKnowledge::load(&state.pool, brand)
        .await
        .map_err(|e| map_db_error(rid, &e))?;
    let result = generate_and_store(&state.pool, &knowledge, &options)
        .await
        .map_err(|e| map_perception_error(rid, &e))?;
    Ok(ApiResponse::new(&req_id, result))
}
