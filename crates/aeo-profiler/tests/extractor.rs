//! Extraction against a mocked chat completions endpoint.

use std::time::Duration;

use aeo_crawler::{CrawlResult, PageMetadata};
use aeo_llm::OpenAiClient;
use aeo_profiler::{BrandExtractor, CompetitorContext, ProfilerError, PROFILE_VERSION};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn extractor(server: &MockServer) -> BrandExtractor {
    let client = OpenAiClient::with_base_url("sk-test", 5, &server.uri())
        .expect("client builds")
        .with_retry(0, 0);
    BrandExtractor::new(client, "gpt-4o-mini", Duration::ZERO)
}

fn crawl(content: &str) -> CrawlResult {
    CrawlResult {
        url: "https://acme.example".to_owned(),
        content: content.to_owned(),
        metadata: PageMetadata::default(),
        urls: vec!["https://acme.example".to_owned()],
        page_count: 1,
    }
}

fn reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "gpt-4o-mini",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    }))
}

#[tokio::test]
async fn extract_profile_stamps_metadata_and_clamps() {
    let server = MockServer::start().await;
    let body = json!({
        "brandIdentity": {
            "brandName": "Acme",
            "mission": { "statement": "Make revenue visible", "confidence": 1.4, "isExplicit": true },
            "vision": "See everything",
            "foundingYear": 2014,
            "sectionConfidence": 0.9
        },
        "competitiveLandscape": {
            "competitors": [{ "name": "Looker", "type": "direct", "confidence": -0.5 }]
        },
        "profileMetadata": { "overallConfidence": 0.82 }
    });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Dashboards for revenue teams"))
        .respond_with(reply(&body.to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let profile = extractor(&server)
        .extract_profile(&crawl("# Acme\nDashboards for revenue teams"))
        .await
        .unwrap();

    assert_eq!(profile.profile_version, PROFILE_VERSION);
    assert_eq!(profile.source_url, "https://acme.example");
    assert!(!profile.generated_at.is_empty());
    assert_eq!(profile.brand_identity.brand_name, "Acme");
    assert!((profile.brand_identity.mission.confidence - 1.0).abs() < f64::EPSILON);
    assert_eq!(profile.brand_identity.vision.statement, "See everything");
    assert_eq!(profile.founding_year(), Some(2014));
    assert!(profile.competitive_landscape.competitors[0].confidence.abs() < f64::EPSILON);
}

#[tokio::test]
async fn identify_competitors_drops_blank_names() {
    let server = MockServer::start().await;
    let body = json!({
        "competitors": [
            { "name": "Looker", "type": "direct", "confidence": 0.9 },
            { "name": "  ", "type": "indirect", "confidence": 0.5 },
            { "name": "Tableau", "type": "aspirational", "confidence": 3 }
        ]
    });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Industry: Analytics"))
        .respond_with(reply(&format!("```json\n{body}\n```")))
        .mount(&server)
        .await;

    let context = CompetitorContext {
        industry: "Analytics".to_owned(),
        ..CompetitorContext::default()
    };
    let competitors = extractor(&server)
        .identify_competitors(&crawl("Acme dashboards"), &context)
        .await
        .unwrap();

    let names: Vec<&str> = competitors.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Looker", "Tableau"]);
    assert!((competitors[1].confidence - 1.0).abs() < f64::EPSILON);
    assert_eq!(competitors[1].competitor_type, "aspirational");
}

#[tokio::test]
async fn categorize_products_reads_hero_offerings() {
    let server = MockServer::start().await;
    let body = json!({
        "portfolioType": "products",
        "heroOfferings": [{ "name": "Dashboards", "keyBenefits": ["Real-time"] }],
        "categories": [{ "name": "Forecasting", "productCount": 3 }],
        "sectionConfidence": 0.7
    });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(reply(&body.to_string()))
        .mount(&server)
        .await;

    let portfolio = extractor(&server)
        .categorize_products(&crawl("Acme products"))
        .await
        .unwrap();

    assert_eq!(portfolio.hero_offerings[0].name, "Dashboards");
    assert_eq!(portfolio.categories[0].name, "Forecasting");
}

#[tokio::test]
async fn empty_crawl_content_never_reaches_the_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(reply("{}"))
        .expect(0)
        .mount(&server)
        .await;

    let err = extractor(&server)
        .extract_identity(&crawl("   \n"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProfilerError::EmptyContent(url) if url == "https://acme.example"));
}

#[tokio::test]
async fn model_errors_surface_as_llm_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad request"))
        .mount(&server)
        .await;

    let err = extractor(&server)
        .extract_profile(&crawl("Acme"))
        .await
        .unwrap_err();
    assert!(matches!(err, ProfilerError::Llm(_)));
}
