mod brands;
mod corrections;
mod insights;
mod prompts;
mod reports;
mod scans;

use std::sync::Arc;
use std::time::Duration;

use aeo_db::{BrandRow, DbError};
use aeo_perception::PerceptionError;
use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};
use crate::services::Services;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub services: Arc<Services>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(request_id: &RequestId, data: T) -> Json<Self> {
        Json(Self {
            data,
            meta: ResponseMeta::new(request_id.0.clone()),
        })
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "service_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Shared handler helpers
// ---------------------------------------------------------------------------

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: &str, error: &DbError) -> ApiError {
    match error {
        DbError::NotFound => ApiError::new(request_id, "not_found", "record not found"),
        DbError::InvalidScanTransition { .. } | DbError::InvalidCorrectionTransition { .. } => {
            ApiError::new(request_id, "conflict", error.to_string())
        }
        _ => {
            tracing::error!(error = %error, "database query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

pub(super) fn map_perception_error(request_id: &str, error: &PerceptionError) -> ApiError {
    match error {
        PerceptionError::Db(e) => map_db_error(request_id, e),
        PerceptionError::ScanNotFound(_) => {
            ApiError::new(request_id, "not_found", error.to_string())
        }
        PerceptionError::NotEnoughScans(_)
        | PerceptionError::ScanBrandMismatch
        | PerceptionError::NoPrompts(_)
        | PerceptionError::NoPlatforms => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        PerceptionError::Llm(aeo_llm::LlmError::MissingApiKey(_)) => {
            ApiError::new(request_id, "service_unavailable", error.to_string())
        }
        _ => {
            tracing::error!(error = %error, "perception request failed");
            ApiError::new(request_id, "internal_error", error.to_string())
        }
    }
}

pub(super) fn unavailable(request_id: &str, what: &str) -> ApiError {
    ApiError::new(
        request_id,
        "service_unavailable",
        format!("{what} is not configured on this server"),
    )
}

pub(super) async fn resolve_brand(
    pool: &PgPool,
    request_id: &str,
    slug: &str,
) -> Result<BrandRow, ApiError> {
    aeo_db::get_brand_by_slug(pool, slug)
        .await
        .map_err(|e| map_db_error(request_id, &e))?
        .ok_or_else(|| ApiError::new(request_id, "not_found", format!("brand '{slug}' not found")))
}

pub(super) fn parse_public_id(request_id: &str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::new(
            request_id,
            "validation_error",
            format!("'{raw}' is not a valid id"),
        )
    })
}

/// Parses a text enum, reporting the field name on failure.
pub(super) fn parse_field<T>(request_id: &str, field: &str, raw: &str) -> Result<T, ApiError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| {
        ApiError::new(request_id, "validation_error", format!("{field}: {e}"))
    })
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/brands",
            get(brands::list_brands).post(brands::create_brand),
        )
        .route("/api/v1/brands/{slug}", get(brands::get_brand))
        .route("/api/v1/brands/{slug}/analyze", post(brands::analyze_brand))
        .route(
            "/api/v1/brands/{slug}/profile",
            get(brands::get_profile).put(brands::put_profile),
        )
        .route(
            "/api/v1/brands/{slug}/review-queue",
            get(brands::review_queue),
        )
        .route("/api/v1/brands/{slug}/prompts", get(prompts::list_prompts))
        .route(
            "/api/v1/brands/{slug}/prompts/generate",
            post(prompts::generate_prompts),
        )
        .route(
            "/api/v1/brands/{slug}/scans",
            get(scans::list_scans).post(scans::start_scan),
        )
        .route(
            "/api/v1/brands/{slug}/scans/compare",
            post(scans::compare_scans),
        )
        .route("/api/v1/scans/{id}", get(scans::get_scan))
        .route("/api/v1/scans/{id}/results", get(scans::list_results))
        .route(
            "/api/v1/brands/{slug}/insights",
            get(insights::list_insights),
        )
        .route("/api/v1/insights/{id}", patch(insights::update_insight))
        .route(
            "/api/v1/insights/{id}/dismiss",
            post(insights::dismiss_insight),
        )
        .route(
            "/api/v1/insights/{id}/corrections",
            post(corrections::create_correction),
        )
        .route(
            "/api/v1/brands/{slug}/corrections",
            get(corrections::list_corrections),
        )
        .route("/api/v1/corrections/{id}", get(corrections::get_correction))
        .route(
            "/api/v1/corrections/{id}/approve",
            post(corrections::approve_correction),
        )
        .route(
            "/api/v1/corrections/{id}/implement",
            post(corrections::implement_correction),
        )
        .route(
            "/api/v1/corrections/{id}/verify",
            post(corrections::verify_correction),
        )
        .route(
            "/api/v1/corrections/{id}/dismiss",
            post(corrections::dismiss_correction),
        )
        .route(
            "/api/v1/brands/{slug}/reports/summary",
            get(reports::summary_report),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match aeo_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            ApiResponse::new(
                &req_id,
                HealthData {
                    status: "ok",
                    database: "ok",
                },
            ),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiResponse::new(
                    &req_id,
                    HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                ),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
