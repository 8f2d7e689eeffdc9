//! Judge and correction generation against a local `wiremock` OpenAI.

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use aeo_core::{FixType, InsightCategory, InsightPriority, ProblemType};
use aeo_llm::OpenAiClient;
use aeo_perception::{CorrectionGenerator, Evaluator, GroundTruth, InsightBrief, PromptContext};

fn openai(server: &MockServer) -> OpenAiClient {
    OpenAiClient::with_base_url("sk-test", 5, &server.uri())
        .expect("client builds")
        .with_retry(0, 0)
}

fn reply(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "model": "gpt-4o-mini",
        "choices": [{ "index": 0, "message": { "role": "assistant", "content": content } }]
    }))
}

fn truth() -> GroundTruth {
    GroundTruth {
        brand_name: "Acme".to_string(),
        competitors: vec!["Globex".to_string()],
        claims: vec!["Acme was founded in 2015".to_string()],
        ..GroundTruth::default()
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn evaluator_decodes_judge_reply() {
    let server = MockServer::start().await;
    let judge = json!({
        "faithfulness": { "score": 85, "errors": ["wrong founding year"] },
        "shareOfVoice": {
            "score": 60,
            "brandMentioned": true,
            "brandPosition": 2,
            "competitorsMentioned": [{ "name": "Globex", "position": 1 }]
        },
        "sentiment": { "overall": 0.4, "label": "Positive" },
        "voiceAlignment": { "score": 70 },
        "hallucination": { "score": 90, "detected": [], "passedTrapTest": true },
        "summary": "Mostly accurate."
    });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("IS HALLUCINATION TRAP: NO"))
        .respond_with(reply(&format!("```json\n{judge}\n```")))
        .expect(1)
        .mount(&server)
        .await;

    let evaluator = Evaluator::new(openai(&server), "gpt-4o-mini");
    let prompt = PromptContext {
        prompt_text: "What is Acme?".to_string(),
        ..PromptContext::default()
    };
    let evaluation = evaluator
        .evaluate(&prompt, "Acme makes dashboards.", &truth())
        .await
        .unwrap();

    let m = &evaluation.metrics;
    assert!((m.faithfulness_score - 85.0).abs() < f64::EPSILON);
    assert!(m.brand_mentioned);
    assert_eq!(m.brand_position, Some(2));
    assert_eq!(m.competitors_mentioned, vec!["Globex".to_string()]);
    assert_eq!(m.sentiment_label, "positive");
    assert!(!m.hallucination_detected());
    assert_eq!(evaluation.raw["summary"], "Mostly accurate.");
}

#[tokio::test]
async fn evaluator_surfaces_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let evaluator = Evaluator::new(openai(&server), "gpt-4o-mini");
    let result = evaluator
        .evaluate(&PromptContext::default(), "anything", &truth())
        .await;
    assert!(matches!(result, Err(aeo_perception::PerceptionError::Llm(_))));
}

// ---------------------------------------------------------------------------
// Corrections
// ---------------------------------------------------------------------------

async fn mount_fix(server: &MockServer, system_marker: &str, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains(system_marker))
        .respond_with(reply(content))
        .expect(1)
        .mount(server)
        .await;
}

fn brief(category: InsightCategory, priority: InsightPriority) -> InsightBrief {
    InsightBrief {
        category,
        priority,
        title: "Low AI Visibility".to_string(),
        description: "Acme is mentioned in only 12% of AI responses.".to_string(),
        platforms: vec!["chatgpt".to_string()],
    }
}

#[tokio::test]
async fn urgent_insight_gets_all_four_fixes() {
    let server = MockServer::start().await;
    mount_fix(
        &server,
        "Schema.org expert",
        "```json\n{\"@type\": \"Organization\", \"name\": \"Acme\"}\n```",
    )
    .await;
    mount_fix(
        &server,
        "FAQ optimization",
        r#"[{"question": "What is Acme?", "answer": "An analytics company."}]"#,
    )
    .await;
    mount_fix(
        &server,
        "Create actionable content recommendations",
        r#"{"sectionTitle": "About", "headline": "Analytics", "outline": ["Intro"],
            "keyMessages": ["Fast"], "toneGuidance": "Plain"}"#,
    )
    .await;
    mount_fix(
        &server,
        "Wikipedia policies",
        r#"{"suggestedEdits": ["Add founding year"], "sourcesNeeded": ["Press"],
            "existingClaimsToUpdate": [], "notes": "Cite sources."}"#,
    )
    .await;

    let generator = CorrectionGenerator::new(openai(&server), "gpt-4o-mini");
    let plan = generator
        .generate(
            &brief(InsightCategory::Visibility, InsightPriority::Critical),
            &truth(),
        )
        .await;

    assert_eq!(plan.problem_type, ProblemType::MissingInfo);
    assert_eq!(plan.suggestions.len(), 4);
    assert_eq!(
        plan.content_for(FixType::SchemaOrg),
        Some("{\"@type\": \"Organization\", \"name\": \"Acme\"}")
    );
    assert_eq!(
        plan.content_for(FixType::Faq),
        Some("Q: What is Acme?\nA: An analytics company.")
    );
    assert!(plan
        .content_for(FixType::Content)
        .is_some_and(|c| c.starts_with("## About")));
    assert!(plan
        .content_for(FixType::Wikipedia)
        .is_some_and(|c| c.contains("- Add founding year")));
}

#[tokio::test]
async fn failed_fix_is_left_out() {
    let server = MockServer::start().await;
    mount_fix(&server, "Schema.org expert", "{\"@type\": \"Organization\"}").await;
    mount_fix(&server, "FAQ optimization", "Q: plain").await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Create actionable content recommendations"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let generator = CorrectionGenerator::new(openai(&server), "gpt-4o-mini");
    let plan = generator
        .generate(
            &brief(InsightCategory::Voice, InsightPriority::Medium),
            &truth(),
        )
        .await;

    let kinds: Vec<FixType> = plan.suggestions.iter().map(|s| s.fix_type).collect();
    assert_eq!(kinds, vec![FixType::SchemaOrg, FixType::Faq]);
}
