use super::*;
use aeo_db::{NewBrand, NewInsight, NewPrompt};
use aeo_llm::OpenAiClient;
use aeo_perception::{CorrectionGenerator, Evaluator, PlatformQuerier, ScanOrchestrator};
use axum::body::{to_bytes, Body};
use axum::http::Request;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// -------------------------------------------------------------------------
// Helpers (no DB)
// -------------------------------------------------------------------------

fn status_of(error: ApiError) -> StatusCode {
    error.into_response().status()
}

#[test]
fn normalize_limit_defaults_and_clamps() {
    assert_eq!(normalize_limit(None), 50);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(-5)), 1);
    assert_eq!(normalize_limit(Some(75)), 75);
    assert_eq!(normalize_limit(Some(10_000)), 200);
}

#[test]
fn db_errors_map_to_http_statuses() {
    assert_eq!(
        status_of(map_db_error("r", &DbError::NotFound)),
        StatusCode::NOT_FOUND
    );
    let transition = DbError::InvalidCorrectionTransition {
        public_id: Uuid::nil(),
        from: "verified".to_string(),
        to: "dismissed",
    };
    assert_eq!(
        status_of(map_db_error("r", &transition)),
        StatusCode::CONFLICT
    );
    assert_eq!(
        status_of(map_db_error("r", &DbError::InvalidStoredValue("x".into()))),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn perception_errors_map_to_http_statuses() {
    assert_eq!(
        status_of(map_perception_error("r", &PerceptionError::NotEnoughScans(1))),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(map_perception_error(
            "r",
            &PerceptionError::ScanNotFound(Uuid::nil())
        )),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_of(map_perception_error(
            "r",
            &PerceptionError::Llm(aeo_llm::LlmError::MissingApiKey("OPENAI_API_KEY"))
        )),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(
        status_of(map_perception_error(
            "r",
            &PerceptionError::AllEvaluationsFailed(3)
        )),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn parse_field_names_the_field() {
    let err = parse_field::<aeo_core::Platform>("r", "platforms", "myspace").unwrap_err();
    assert_eq!(err.error.code, "validation_error");
    assert!(err.error.message.starts_with("platforms: "));
    assert!(parse_public_id("r", "not-a-uuid").is_err());
}

// -------------------------------------------------------------------------
// Route helpers (with DB)
// -------------------------------------------------------------------------

fn app(pool: sqlx::PgPool, services: Services) -> Router {
    build_app(
        AppState {
            pool,
            services: Arc::new(services),
        },
        AuthState::disabled(),
        RateLimitState::new(10_000, Duration::from_secs(60)),
    )
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json parse")
    };
    (status, json)
}

async fn seed_brand(pool: &sqlx::PgPool) -> BrandRow {
    aeo_db::create_brand(
        pool,
        &NewBrand {
            name: "Acme Analytics",
            slug: "acme-analytics",
            domain: "acme.com",
            industry: Some("software"),
            review_sites: &[],
        },
    )
    .await
    .expect("create_brand failed")
}

async fn seed_prompts(pool: &sqlx::PgPool, brand_id: i64) {
    let prompts = vec![
        NewPrompt {
            template_id: "nav_1".to_string(),
            category: "navigational".to_string(),
            intent: "informational".to_string(),
            prompt_text: "What is Acme Analytics?".to_string(),
            priority: 10,
            ..NewPrompt::default()
        },
        NewPrompt {
            template_id: "comp_1".to_string(),
            category: "comparative".to_string(),
            intent: "comparison".to_string(),
            prompt_text: "Acme Analytics vs Globex?".to_string(),
            priority: 7,
            ..NewPrompt::default()
        },
    ];
    aeo_db::upsert_prompts(pool, brand_id, &prompts)
        .await
        .expect("upsert_prompts failed");
}

async fn seed_insight(pool: &sqlx::PgPool, brand_id: i64) -> Uuid {
    let rows = aeo_db::insert_insights(
        pool,
        brand_id,
        None,
        &[NewInsight {
            category: "accuracy".to_string(),
            priority: "high".to_string(),
            title: "AI answers get the founding year wrong".to_string(),
            description: "Faithfulness is 55 across platforms.".to_string(),
            impact: "Users see incorrect facts".to_string(),
            recommendation: "Publish structured company facts".to_string(),
            current_value: Some(55.0),
            target_value: Some(80.0),
            effort: "medium".to_string(),
            affected_platforms: vec!["chatgpt".to_string()],
            affected_categories: vec![],
        }],
    )
    .await
    .expect("insert_insights failed");
    rows[0].public_id
}

fn openai(server: &MockServer) -> OpenAiClient {
    OpenAiClient::with_base_url("sk-test", 5, &server.uri())
        .expect("client builds")
        .with_retry(0, 0)
}

async fn mock_openai(content: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini",
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
        })))
        .mount(&server)
        .await;
    server
}

fn judge_content() -> String {
    json!({
        "faithfulness": { "score": 80, "errors": [] },
        "shareOfVoice": { "score": 40, "brandMentioned": true },
        "sentiment": { "overall": 0.3, "label": "positive" },
        "voiceAlignment": { "score": 65 },
        "hallucination": { "score": 90, "detected": [], "passedTrapTest": true }
    })
    .to_string()
}

// -------------------------------------------------------------------------
// Health and auth
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn health_is_public_and_reports_database(pool: sqlx::PgPool) {
    let app = build_app(
        AppState {
            pool,
            services: Arc::new(Services::default()),
        },
        AuthState::from_keys("secret", false).expect("auth"),
        default_rate_limit_state(),
    );

    let (status, json) = send(&app, "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["database"], "ok");
    assert!(json["meta"]["request_id"].is_string());

    let (status, json) = send(&app, "GET", "/api/v1/brands", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");
}

#[sqlx::test(migrations = "../../migrations")]
async fn bearer_token_unlocks_protected_routes(pool: sqlx::PgPool) {
    let app = build_app(
        AppState {
            pool,
            services: Arc::new(Services::default()),
        },
        AuthState::from_keys("secret", false).expect("auth"),
        default_rate_limit_state(),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/brands")
                .header(header::AUTHORIZATION, "Bearer secret")
                .header("x-request-id", "req-123")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-123")
    );
}

// -------------------------------------------------------------------------
// Brands
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_brand_validates_and_rejects_duplicates(pool: sqlx::PgPool) {
    let app = app(pool, Services::default());

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/brands",
        Some(json!({ "name": "Acme Analytics", "domain": "acme.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["slug"], "acme-analytics");

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/brands",
        Some(json!({ "name": "Acme  Analytics!", "domain": "acme.io" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"]["code"], "conflict");

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/brands",
        Some(json!({ "name": "   ", "domain": "blank.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../migrations")]
async fn brand_detail_counts_prompts_and_scans(pool: sqlx::PgPool) {
    let brand = seed_brand(&pool).await;
    seed_prompts(&pool, brand.id).await;
    let app = app(pool, Services::default());

    let (status, json) = send(&app, "GET", "/api/v1/brands/acme-analytics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["name"], "Acme Analytics");
    assert_eq!(json["data"]["has_profile"], false);
    assert_eq!(json["data"]["active_prompts"], 2);
    assert_eq!(json["data"]["total_scans"], 0);
    assert!(json["data"]["latest_scan"].is_null());

    let (status, _) = send(&app, "GET", "/api/v1/brands/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../migrations")]
async fn profile_can_be_written_and_reviewed(pool: sqlx::PgPool) {
    seed_brand(&pool).await;
    let app = app(pool, Services::default());

    let (status, _) = send(&app, "GET", "/api/v1/brands/acme-analytics/profile", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let mut profile = aeo_profiler::Brand360Profile::default();
    profile.brand_identity.brand_name = "Acme Analytics".to_string();
    profile.brand_identity.mission.statement = "Analytics for everyone".to_string();
    profile.brand_identity.mission.confidence = 0.4;
    profile.brand_identity.section_confidence = 0.9;
    let (status, json) = send(
        &app,
        "PUT",
        "/api/v1/brands/acme-analytics/profile",
        Some(serde_json::to_value(&profile).expect("profile json")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["data"]["profile"].is_object());

    let (status, json) = send(
        &app,
        "GET",
        "/api/v1/brands/acme-analytics/review-queue?threshold=0.5",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let queue = json["data"].as_array().expect("data array");
    assert!(queue.iter().any(|item| item["field"] == "mission"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn analysis_without_crawler_is_unavailable(pool: sqlx::PgPool) {
    seed_brand(&pool).await;
    let app = app(pool, Services::default());

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/brands/acme-analytics/analyze",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "service_unavailable");
}

// -------------------------------------------------------------------------
// Prompts
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn generated_prompts_are_listed_by_category(pool: sqlx::PgPool) {
    seed_brand(&pool).await;
    let app = app(pool, Services::default());

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/brands/acme-analytics/prompts/generate",
        Some(json!({ "categories": ["navigational", "comparative"], "max_per_category": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let total = json["data"]["total"].as_u64().expect("total");
    assert!(total > 0 && total <= 6);

    let (status, json) = send(
        &app,
        "GET",
        "/api/v1/brands/acme-analytics/prompts?category=navigational",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let prompts = json["data"].as_array().expect("data array");
    assert!(!prompts.is_empty());
    assert!(prompts.iter().all(|p| p["category"] == "navigational"));

    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/brands/acme-analytics/prompts?category=gossip",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// -------------------------------------------------------------------------
// Scans
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn scan_without_judge_is_unavailable(pool: sqlx::PgPool) {
    seed_brand(&pool).await;
    let app = app(pool, Services::default());

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/brands/acme-analytics/scans",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[sqlx::test(migrations = "../../migrations")]
async fn scan_runs_in_background_and_reports_results(pool: sqlx::PgPool) {
    let brand = seed_brand(&pool).await;
    seed_prompts(&pool, brand.id).await;
    let judge = mock_openai(&judge_content()).await;
    let services = Services {
        scans: Some(ScanOrchestrator::new(
            pool.clone(),
            PlatformQuerier::new(None, None, true),
            Evaluator::new(openai(&judge), "gpt-4o-mini"),
            2,
        )),
        ..Services::default()
    };
    let app = app(pool, services);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/brands/acme-analytics/scans",
        Some(json!({ "platforms": ["myspace"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/brands/acme-analytics/scans",
        Some(json!({ "platforms": ["chatgpt", "claude"] })),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["prompt_count"], 4);
    let scan_id = json["data"]["id"].as_str().expect("scan id").to_string();

    let mut scan = Value::Null;
    for _ in 0..100 {
        let (_, json) = send(&app, "GET", &format!("/api/v1/scans/{scan_id}"), None).await;
        scan = json["data"].clone();
        if scan["status"] == "completed" || scan["status"] == "failed" {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert_eq!(scan["status"], "completed");
    assert_eq!(scan["completed_count"], 4);
    assert!(scan["overall_score"].is_number());

    let (status, json) = send(
        &app,
        "GET",
        &format!("/api/v1/scans/{scan_id}/results"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().map(Vec::len), Some(4));

    let (status, json) = send(&app, "GET", "/api/v1/brands/acme-analytics/scans", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));

    let (status, json) = send(
        &app,
        "POST",
        "/api/v1/brands/acme-analytics/scans/compare",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_scan_ids_are_rejected(pool: sqlx::PgPool) {
    let app = app(pool, Services::default());

    let (status, _) = send(&app, "GET", "/api/v1/scans/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", &format!("/api/v1/scans/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// -------------------------------------------------------------------------
// Insights and corrections
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn insight_status_can_be_changed_and_filtered(pool: sqlx::PgPool) {
    let brand = seed_brand(&pool).await;
    let insight_id = seed_insight(&pool, brand.id).await;
    let app = app(pool, Services::default());

    let (status, json) = send(
        &app,
        "GET",
        "/api/v1/brands/acme-analytics/insights?status=open",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));

    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/v1/insights/{insight_id}"),
        Some(json!({ "status": "archived" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/v1/insights/{insight_id}/dismiss"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "dismissed");

    let (_, json) = send(
        &app,
        "GET",
        "/api/v1/brands/acme-analytics/insights?status=open",
        None,
    )
    .await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(0));
}

#[sqlx::test(migrations = "../../migrations")]
async fn correction_workflow_moves_through_its_states(pool: sqlx::PgPool) {
    let brand = seed_brand(&pool).await;
    let insight_id = seed_insight(&pool, brand.id).await;
    let llm = mock_openai("```json\n{\"@context\": \"https://schema.org\"}\n```").await;
    let services = Services {
        corrections: Some(CorrectionGenerator::new(openai(&llm), "gpt-4o")),
        ..Services::default()
    };
    let app = app(pool, services);

    let (status, json) = send(
        &app,
        "POST",
        &format!("/api/v1/insights/{insight_id}/corrections"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["data"]["correction"]["status"], "suggested");
    assert!(json["data"]["plan"]["suggestions"].is_array());
    let correction_id = json["data"]["correction"]["id"]
        .as_str()
        .expect("correction id")
        .to_string();
    let base = format!("/api/v1/corrections/{correction_id}");

    let (status, _) = send(&app, "POST", &format!("{base}/implement"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        &format!("{base}/approve"),
        Some(json!({ "approved_fixes": ["carrier_pigeon"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        &app,
        "POST",
        &format!("{base}/approve"),
        Some(json!({ "approved_fixes": ["schema_org", "faq", "schema_org"], "notes": "ship it" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "approved");
    assert_eq!(json["data"]["approved_fixes"], json!(["schema_org", "faq"]));

    let (status, _) = send(&app, "POST", &format!("{base}/implement"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(
        &app,
        "POST",
        &format!("{base}/verify"),
        Some(json!({ "post_fix_score": 72 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "verified");
    assert_eq!(json["data"]["post_fix_score"], 72);

    let (status, _) = send(&app, "POST", &format!("{base}/dismiss"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = send(
        &app,
        "GET",
        "/api/v1/brands/acme-analytics/corrections?status=verified",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));

    let (_, json) = send(
        &app,
        "GET",
        "/api/v1/brands/acme-analytics/insights?status=resolved",
        None,
    )
    .await;
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));
}

#[sqlx::test(migrations = "../../migrations")]
async fn correction_generation_without_llm_is_unavailable(pool: sqlx::PgPool) {
    let brand = seed_brand(&pool).await;
    let insight_id = seed_insight(&pool, brand.id).await;
    let app = app(pool, Services::default());

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/insights/{insight_id}/corrections"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// -------------------------------------------------------------------------
// Reports
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn summary_report_validates_range(pool: sqlx::PgPool) {
    seed_brand(&pool).await;
    let app = app(pool, Services::default());

    let (status, json) = send(
        &app,
        "GET",
        "/api/v1/brands/acme-analytics/reports/summary",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["summary"]["total_scans"], 0);
    assert_eq!(json["data"]["summary"]["quadrant"], "invisible");

    let (status, _) = send(
        &app,
        "GET",
        "/api/v1/brands/acme-analytics/reports/summary?range=1y",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
