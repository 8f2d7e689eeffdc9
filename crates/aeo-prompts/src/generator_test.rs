use super::*;
use crate::context::{PersonaInput, ProductInput};
use aeo_core::{PersonaType, ThreatLevel};

fn context() -> GenerationContext {
    GenerationContext {
        brand_name: "Acme".to_string(),
        industry: Some("Analytics".to_string()),
        primary_tone: Some("confident".to_string()),
        personas: vec![
            PersonaInput {
                name: "RevOps Lead".to_string(),
                persona_type: Some(PersonaType::Primary),
                description: Some("revenue operations teams".to_string()),
                pain_points: vec![
                    "manual reporting".to_string(),
                    "data silos".to_string(),
                    "slow forecasts".to_string(),
                    "spreadsheet sprawl".to_string(),
                ],
                goals: vec!["forecast revenue".to_string()],
                common_questions: vec!["How do I build a sales dashboard?".to_string()],
                objections: vec!["Too complex".to_string(), "Too expensive".to_string()],
            },
            PersonaInput {
                name: "Founder".to_string(),
                persona_type: Some(PersonaType::Anti),
                objections: vec!["Too complex".to_string()],
                ..PersonaInput::default()
            },
        ],
        products: vec![
            ProductInput {
                name: "Dashboards".to_string(),
                category: Some("BI platform".to_string()),
                features: vec!["live charts".to_string()],
                benefits: vec!["save time".to_string()],
                use_cases: vec!["pipeline reviews".to_string()],
                is_hero: true,
            },
            ProductInput {
                name: "Forecasts".to_string(),
                use_cases: vec!["pipeline reviews".to_string(), "board reporting".to_string()],
                ..ProductInput::default()
            },
        ],
        competitors: vec![
            CompetitorInput {
                name: "Looker".to_string(),
                threat_level: Some(ThreatLevel::Low),
            },
            CompetitorInput {
                name: "Tableau".to_string(),
                threat_level: Some(ThreatLevel::High),
            },
            CompetitorInput {
                name: "Sheets".to_string(),
                threat_level: None,
            },
        ],
        claims: vec!["fastest setup".to_string()],
        negative_keywords: vec!["buggy".to_string()],
        misconceptions: vec!["only works with Salesforce".to_string()],
        ..GenerationContext::default()
    }
}

fn only(category: PromptCategory) -> GeneratorOptions {
    GeneratorOptions {
        categories: vec![category],
        max_per_category: 100,
        review_sites: Vec::new(),
    }
}

fn texts(result: &GenerationResult) -> Vec<&str> {
    result.prompts.iter().map(|p| p.text.as_str()).collect()
}

fn is_sorted_desc(prompts: &[GeneratedPrompt]) -> bool {
    prompts.windows(2).all(|w| w[0].priority >= w[1].priority)
}

#[test]
fn default_options_cover_all_categories_with_cap() {
    let result = generate(&context(), &GeneratorOptions::default());

    assert_eq!(result.category_breakdown.len(), 5);
    assert!(result.category_breakdown.iter().all(|c| c.count <= 15));
    assert_eq!(
        result.total,
        result.category_breakdown.iter().map(|c| c.count).sum::<usize>()
    );
    assert_eq!(result.total, result.prompts.len());
    assert!(result.prompts.iter().all(|p| !p.text.contains('{')));
}

#[test]
fn navigational_uses_industry_and_hero_products() {
    let result = generate(&context(), &only(PromptCategory::Navigational));
    let texts = texts(&result);

    assert_eq!(result.total, 12);
    assert!(texts.contains(&"Is Acme a leader in Analytics?"));
    assert!(texts.contains(&"What is Dashboards by Acme?"));
    assert!(!texts.iter().any(|t| t.contains("Forecasts")), "only hero products");
    let product_prompt = result
        .prompts
        .iter()
        .find(|p| p.template_id == "nav_product_1")
        .unwrap();
    assert_eq!(product_prompt.target_product.as_deref(), Some("Dashboards"));
    assert_eq!(product_prompt.category_label, "The Who");
}

#[test]
fn navigational_defaults_industry_to_technology() {
    let ctx = GenerationContext {
        brand_name: "Acme".to_string(),
        ..GenerationContext::default()
    };
    let result = generate(&ctx, &only(PromptCategory::Navigational));
    assert_eq!(result.total, 10);
    assert!(texts(&result).contains(&"Is Acme a leader in technology?"));
}

#[test]
fn functional_weights_by_persona_and_caps_inputs() {
    let result = generate(&context(), &only(PromptCategory::Functional));
    let texts = texts(&result);

    assert!(is_sorted_desc(&result.prompts));
    let first = &result.prompts[0];
    assert_eq!(first.text, "What is the best solution for manual reporting?");
    assert_eq!(first.priority, 15);
    assert_eq!(first.target_persona.as_deref(), Some("RevOps Lead"));

    assert!(!texts.iter().any(|t| t.contains("spreadsheet sprawl")));
    assert!(texts.contains(&"How do I build a sales dashboard?"));
    assert!(texts.contains(&"Best BI platform for forecast revenue"));
    assert!(texts.contains(&"Is Acme right for revenue operations teams?"));

    let founder = result
        .prompts
        .iter()
        .find(|p| p.text == "Is Acme right for Founder?")
        .unwrap();
    assert_eq!(founder.priority, 4);

    assert!(texts.contains(&"What is the best BI platform for board reporting?"));
    assert!(texts.contains(&"How does Dashboards's live charts work?"));
    assert!(texts.contains(&"How can Acme help me save time?"));
}

#[test]
fn comparative_orders_competitors_by_threat() {
    let result = generate(&context(), &only(PromptCategory::Comparative));
    let texts = texts(&result);

    assert_eq!(result.prompts[0].text, "Acme vs Tableau");
    assert_eq!(result.prompts[0].priority, 13);
    assert!(texts.contains(&"Acme vs Tableau for pipeline reviews"));
    assert_eq!(
        texts
            .iter()
            .filter(|t| **t == "What are the top BI platform solutions?")
            .count(),
        1
    );
    let claim = result
        .prompts
        .iter()
        .find(|p| p.template_id == "comp_claim_2")
        .unwrap();
    assert_eq!(claim.text, "Does Acme have better fastest setup than Tableau?");
    assert_eq!(claim.target_claim.as_deref(), Some("fastest setup"));
    assert!(result.prompts.iter().all(|p| !p.template_id.contains("review")));
    assert_eq!(result.competitors_covered[0], "Tableau");
}

#[test]
fn voice_skips_secondary_archetype_probe_when_unknown() {
    let result = generate(&context(), &only(PromptCategory::Voice));
    assert_eq!(result.total, 10);
    assert!(texts(&result).contains(&"Would you say Acme is a innovative brand?"));
    assert!(result
        .prompts
        .iter()
        .all(|p| p.expected_tone.as_deref() == Some("confident")));
    let vocab = result
        .prompts
        .iter()
        .find(|p| p.template_id == "voice_vocab_1")
        .unwrap();
    assert_eq!(vocab.expected_vocabulary.as_deref(), Some("professional"));

    let mut ctx = context();
    ctx.primary_archetype = Some("Sage".to_string());
    ctx.secondary_archetype = Some("Hero".to_string());
    let result = generate(&ctx, &only(PromptCategory::Voice));
    assert_eq!(result.total, 11);
    assert!(texts(&result).contains(&"Is Acme more Sage or Hero?"));
}

#[test]
fn adversarial_probes_risks_and_sets_traps() {
    let result = generate(&context(), &only(PromptCategory::Adversarial));
    let texts = texts(&result);

    assert_eq!(result.total, 23);
    assert_eq!(
        result.prompts[0].text,
        "I heard only works with Salesforce about Acme, is that true?"
    );
    assert!(texts.contains(&"Too complex - is this true about Acme?"));
    assert!(texts.contains(&"I've heard Acme is buggy, true?"));
    assert!(texts.contains(&"Does Acme offer quantum computing integration?"));
    assert!(texts
        .contains(&"When did Acme win the Global Excellence in Innovation Award 2024 award?"));
    assert!(texts.contains(&"Why should I choose Looker over Acme?"));
    assert!(!texts.iter().any(|t| t.contains("Sheets")));
    assert!(result
        .prompts
        .iter()
        .filter(|p| p.template_id.starts_with("adv_hall"))
        .all(|p| p.hallucination_test));
}

#[test]
fn each_category_is_truncated_after_sorting() {
    let options = GeneratorOptions {
        categories: vec![PromptCategory::Adversarial],
        max_per_category: 5,
        review_sites: Vec::new(),
    };
    let result = generate(&context(), &options);
    assert_eq!(result.total, 5);
    assert!(result.prompts.iter().all(|p| p.priority == 10));
}

#[test]
fn review_sites_render_into_parent_categories() {
    let options = GeneratorOptions {
        review_sites: vec!["G2".to_string(), "  ".to_string(), "Capterra".to_string()],
        ..GeneratorOptions::default()
    };
    let result = generate(&context(), &options);
    let review: Vec<&GeneratedPrompt> = result
        .prompts
        .iter()
        .filter(|p| p.target_review_site.is_some())
        .collect();

    assert_eq!(review.len(), 14);
    assert!(review.iter().all(|p| p.category_label == "The Trust"));
    assert_eq!(result.review_sites_covered, vec!["G2", "Capterra"]);

    let comparison = review
        .iter()
        .find(|p| p.template_id == "comp_review_1")
        .unwrap();
    assert_eq!(comparison.category, PromptCategory::Comparative);
    assert_eq!(comparison.target_competitor.as_deref(), Some("Looker"));
    assert_eq!(comparison.expected_entities.len(), 3);

    let nav = &result.category_breakdown[0];
    assert_eq!(nav.category, PromptCategory::Navigational);
    assert_eq!(nav.count, 12 + 6);
}

#[test]
fn review_comparisons_need_a_competitor() {
    let mut ctx = context();
    ctx.competitors.clear();
    let options = GeneratorOptions {
        review_sites: vec!["G2".to_string()],
        ..GeneratorOptions::default()
    };
    let result = generate(&ctx, &options);
    assert_eq!(result.review_sites_covered, vec!["G2"]);
    assert_eq!(
        result
            .prompts
            .iter()
            .filter(|p| p.target_review_site.is_some())
            .count(),
        5
    );
}

#[test]
fn review_prompts_follow_selected_categories() {
    let options = GeneratorOptions {
        categories: vec![PromptCategory::Voice],
        max_per_category: 15,
        review_sites: vec!["G2".to_string()],
    };
    let result = generate(&context(), &options);
    assert!(result.review_sites_covered.is_empty());
}

#[test]
fn coverage_lists_are_in_first_seen_order() {
    let options = GeneratorOptions {
        max_per_category: 100,
        ..GeneratorOptions::default()
    };
    let result = generate(&context(), &options);
    assert_eq!(result.products_covered[0], "Dashboards");
    assert_eq!(result.personas_covered, vec!["RevOps Lead", "Founder"]);
}

#[test]
fn empty_context_still_produces_brand_prompts() {
    let ctx = GenerationContext {
        brand_name: "Acme".to_string(),
        ..GenerationContext::default()
    };
    let options = GeneratorOptions {
        max_per_category: 100,
        ..GeneratorOptions::default()
    };
    let result = generate(&ctx, &options);
    let counts: Vec<usize> = result.category_breakdown.iter().map(|c| c.count).collect();
    assert_eq!(counts, vec![10, 0, 0, 10, 10]);
}

#[test]
fn context_from_brand_config() {
    let brand: aeo_core::BrandConfig = serde_json::from_value(serde_json::json!({
        "name": "Acme",
        "domain": "acme.example",
        "industry": "Analytics",
        "competitors": [{ "name": "Tableau", "threat_level": "high" }],
        "products": [{ "name": "Dashboards", "is_hero": true }],
        "personas": [{ "name": "RevOps Lead", "type": "primary" }],
        "claims": [{ "text": "fastest setup" }],
        "risk_factors": { "negative_keywords": ["buggy"] }
    }))
    .unwrap();

    let ctx = GenerationContext::from_brand_config(&brand);
    assert_eq!(ctx.brand_name, "Acme");
    assert_eq!(ctx.competitors[0].threat_level, Some(ThreatLevel::High));
    assert_eq!(ctx.personas[0].persona_type, Some(PersonaType::Primary));
    assert_eq!(ctx.claims, vec!["fastest setup"]);
    assert_eq!(ctx.product_category(), "software");
    assert!(ctx.primary_archetype.is_none());
}
