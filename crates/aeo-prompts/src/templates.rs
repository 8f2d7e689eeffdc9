//! The prompt template catalog.
//!
//! Placeholders: `{brandName}`, `{productName}`, `{productCategory}`,
//! `{competitorName}`, `{painPoint}`, `{goal}`, `{objection}`, `{claim}`,
//! `{archetype}`, `{industry}`, `{useCase}`, `{commonQuestion}`,
//! `{misconception}`, `{nonExistentFeature}`, `{reviewSite}`,
//! `{negativeKeyword}`, `{feature}`, `{benefit}`, `{personaDescription}`,
//! `{primaryArchetype}`, `{secondaryArchetype}`.

use aeo_core::{PromptCategory, PromptIntent};
use serde::Serialize;

/// Label used for prompts rendered from review-site templates.
pub const REVIEW_LABEL: &str = "The Trust";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PromptTemplate {
    pub id: &'static str,
    pub text: &'static str,
    pub intent: PromptIntent,
    pub expected_themes: &'static [&'static str],
    pub expected_citations: bool,
    pub adversarial_twist: Option<&'static str>,
    pub hallucination_test: bool,
    pub priority: u8,
}

impl PromptTemplate {
    const fn new(
        id: &'static str,
        text: &'static str,
        intent: PromptIntent,
        expected_themes: &'static [&'static str],
        expected_citations: bool,
        priority: u8,
    ) -> Self {
        Self {
            id,
            text,
            intent,
            expected_themes,
            expected_citations,
            adversarial_twist: None,
            hallucination_test: false,
            priority,
        }
    }

    const fn adversarial(mut self, twist: &'static str, hallucination_test: bool) -> Self {
        self.adversarial_twist = Some(twist);
        self.hallucination_test = hallucination_test;
        self
    }

    /// Review-site templates need a `{reviewSite}` and are rendered separately.
    #[must_use]
    pub fn is_review(&self) -> bool {
        self.id.contains("review")
    }
}

use PromptIntent::{Commercial, Informational, Navigational};

pub static NAVIGATIONAL: [PromptTemplate; 15] = [
    PromptTemplate::new(
        "nav_1",
        "What is {brandName} and what do they do?",
        Informational,
        &["company_overview", "products", "mission"],
        true,
        10,
    ),
    PromptTemplate::new(
        "nav_2",
        "Tell me about {brandName} products",
        Informational,
        &["products", "features", "benefits"],
        true,
        9,
    ),
    PromptTemplate::new(
        "nav_3",
        "Is {brandName} a legitimate company?",
        Navigational,
        &["trust", "credibility", "history"],
        true,
        8,
    ),
    PromptTemplate::new(
        "nav_4",
        "What is {brandName} known for?",
        Informational,
        &["reputation", "differentiators", "awards"],
        true,
        8,
    ),
    PromptTemplate::new(
        "nav_5",
        "Who founded {brandName} and when?",
        Informational,
        &["founders", "history", "origin_story"],
        true,
        6,
    ),
    PromptTemplate::new(
        "nav_6",
        "Where is {brandName} headquartered?",
        Informational,
        &["location", "company_info"],
        true,
        5,
    ),
    PromptTemplate::new(
        "nav_product_1",
        "What is {productName} by {brandName}?",
        Informational,
        &["product_description", "features", "use_cases"],
        true,
        9,
    ),
    PromptTemplate::new(
        "nav_product_2",
        "How does {productName} work?",
        Informational,
        &["functionality", "features", "workflow"],
        false,
        8,
    ),
    PromptTemplate::new(
        "nav_proof_1",
        "Has {brandName} won any awards?",
        Informational,
        &["awards", "recognition", "credibility"],
        true,
        7,
    ),
    PromptTemplate::new(
        "nav_proof_2",
        "What do customers say about {brandName}?",
        Informational,
        &["testimonials", "reviews", "customer_satisfaction"],
        true,
        7,
    ),
    PromptTemplate::new(
        "nav_stats_1",
        "How many customers does {brandName} have?",
        Informational,
        &["customer_base", "scale", "market_presence"],
        true,
        6,
    ),
    PromptTemplate::new(
        "nav_industry_1",
        "Is {brandName} a leader in {industry}?",
        Informational,
        &["market_leadership", "industry_position", "reputation"],
        true,
        7,
    ),
    PromptTemplate::new(
        "nav_review_1",
        "What do customers say about {brandName} on {reviewSite}?",
        Informational,
        &["customer_reviews", "ratings", "testimonials"],
        true,
        8,
    ),
    PromptTemplate::new(
        "nav_review_2",
        "What is {brandName}'s rating on {reviewSite}?",
        Informational,
        &["ratings", "score", "ranking"],
        true,
        8,
    ),
    PromptTemplate::new(
        "nav_review_3",
        "How many reviews does {brandName} have on {reviewSite}?",
        Informational,
        &["review_count", "popularity", "market_presence"],
        true,
        6,
    ),
];

pub static FUNCTIONAL: [PromptTemplate; 18] = [
    PromptTemplate::new(
        "func_pain_1",
        "What is the best solution for {painPoint}?",
        Commercial,
        &["solutions", "features", "benefits"],
        false,
        10,
    ),
    PromptTemplate::new(
        "func_pain_2",
        "How can I solve {painPoint} for my business?",
        Commercial,
        &["solutions", "implementation", "roi"],
        false,
        9,
    ),
    PromptTemplate::new(
        "func_pain_3",
        "What tools help with {painPoint}?",
        Commercial,
        &["tools", "solutions", "comparison"],
        false,
        8,
    ),
    PromptTemplate::new(
        "func_goal_1",
        "What tools can help me {goal}?",
        Commercial,
        &["tools", "features", "comparison"],
        false,
        9,
    ),
    PromptTemplate::new(
        "func_goal_2",
        "Best {productCategory} for {goal}",
        Commercial,
        &["recommendations", "features", "pricing"],
        false,
        10,
    ),
    PromptTemplate::new(
        "func_goal_3",
        "How do I {goal} effectively?",
        Informational,
        &["strategies", "tools", "best_practices"],
        false,
        8,
    ),
    PromptTemplate::new(
        "func_question_1",
        "{commonQuestion}",
        Informational,
        &["answer", "explanation", "resources"],
        true,
        8,
    ),
    PromptTemplate::new(
        "func_usecase_1",
        "What is the best {productCategory} for {useCase}?",
        Commercial,
        &["recommendations", "use_case_fit", "features"],
        false,
        9,
    ),
    PromptTemplate::new(
        "func_usecase_2",
        "Which {productCategory} is best for small businesses?",
        Commercial,
        &["recommendations", "pricing", "scalability"],
        false,
        8,
    ),
    PromptTemplate::new(
        "func_usecase_3",
        "Enterprise {productCategory} recommendations",
        Commercial,
        &["enterprise_features", "security", "scalability"],
        false,
        7,
    ),
    PromptTemplate::new(
        "func_feature_1",
        "How does {productName}'s {feature} work?",
        Informational,
        &["feature_details", "functionality", "implementation"],
        false,
        8,
    ),
    PromptTemplate::new(
        "func_feature_2",
        "What are the benefits of {feature} in {productName}?",
        Commercial,
        &["feature_benefits", "value_proposition", "use_cases"],
        false,
        8,
    ),
    PromptTemplate::new(
        "func_benefit_1",
        "How can {brandName} help me {benefit}?",
        Commercial,
        &["solution", "outcomes", "value"],
        false,
        9,
    ),
    PromptTemplate::new(
        "func_benefit_2",
        "What results can I expect from {productName}?",
        Commercial,
        &["outcomes", "roi", "success_stories"],
        true,
        8,
    ),
    PromptTemplate::new(
        "func_journey_1",
        "Is {brandName} right for {personaDescription}?",
        Commercial,
        &["fit_assessment", "target_audience", "use_cases"],
        false,
        8,
    ),
    PromptTemplate::new(
        "func_journey_2",
        "What should I consider before buying {productName}?",
        Commercial,
        &["buying_criteria", "considerations", "evaluation"],
        false,
        7,
    ),
    PromptTemplate::new(
        "func_review_1",
        "Does {reviewSite} recommend {brandName} for {useCase}?",
        Commercial,
        &["recommendation", "use_case_fit", "review_opinion"],
        true,
        8,
    ),
    PromptTemplate::new(
        "func_review_2",
        "What do {reviewSite} reviewers say about {brandName} for small businesses?",
        Commercial,
        &["segment_fit", "reviews", "recommendations"],
        true,
        7,
    ),
];

pub static COMPARATIVE: [PromptTemplate; 11] = [
    PromptTemplate::new(
        "comp_1",
        "{brandName} vs {competitorName}",
        Commercial,
        &["comparison", "differentiators", "pricing"],
        true,
        10,
    ),
    PromptTemplate::new(
        "comp_2",
        "What is better, {brandName} or {competitorName}?",
        Commercial,
        &["comparison", "pros_cons", "recommendations"],
        true,
        10,
    ),
    PromptTemplate::new(
        "comp_3",
        "{brandName} vs {competitorName} for {useCase}",
        Commercial,
        &["comparison", "use_case_fit", "recommendation"],
        true,
        9,
    ),
    PromptTemplate::new(
        "comp_4",
        "Compare {brandName} and {competitorName} pricing",
        Commercial,
        &["pricing", "value", "tiers"],
        true,
        8,
    ),
    PromptTemplate::new(
        "comp_alt_1",
        "Best alternatives to {competitorName}",
        Commercial,
        &["alternatives", "comparison", "recommendations"],
        false,
        9,
    ),
    PromptTemplate::new(
        "comp_alt_2",
        "What are the top {productCategory} solutions?",
        Commercial,
        &["ranking", "comparison", "features"],
        false,
        8,
    ),
    PromptTemplate::new(
        "comp_alt_3",
        "{competitorName} competitors",
        Commercial,
        &["alternatives", "comparison", "market"],
        false,
        8,
    ),
    PromptTemplate::new(
        "comp_claim_1",
        "Which {productCategory} has the best {claim}?",
        Commercial,
        &["claim_verification", "comparison", "evidence"],
        true,
        8,
    ),
    PromptTemplate::new(
        "comp_claim_2",
        "Does {brandName} have better {claim} than {competitorName}?",
        Commercial,
        &["comparison", "claim_verification", "evidence"],
        true,
        9,
    ),
    PromptTemplate::new(
        "comp_review_1",
        "How does {brandName} compare to {competitorName} on {reviewSite}?",
        Commercial,
        &["review_comparison", "ratings_comparison", "features"],
        true,
        9,
    ),
    PromptTemplate::new(
        "comp_review_2",
        "Which has better reviews on {reviewSite}, {brandName} or {competitorName}?",
        Commercial,
        &["review_comparison", "ratings", "winner"],
        true,
        8,
    ),
];

pub static VOICE: [PromptTemplate; 11] = [
    PromptTemplate::new(
        "voice_1",
        "Describe {brandName} in a few words",
        Informational,
        &["brand_personality", "positioning", "values"],
        false,
        7,
    ),
    PromptTemplate::new(
        "voice_2",
        "What kind of company is {brandName}?",
        Informational,
        &["culture", "values", "positioning"],
        true,
        7,
    ),
    PromptTemplate::new(
        "voice_3",
        "Is {brandName} innovative or traditional?",
        Informational,
        &["innovation", "positioning", "culture"],
        false,
        6,
    ),
    PromptTemplate::new(
        "voice_4",
        "What are {brandName}'s core values?",
        Informational,
        &["values", "mission", "culture"],
        true,
        7,
    ),
    PromptTemplate::new(
        "voice_arch_1",
        "Would you say {brandName} is a {archetype} brand?",
        Informational,
        &["archetype_alignment", "personality", "values"],
        false,
        6,
    ),
    PromptTemplate::new(
        "voice_arch_2",
        "What type of brand personality does {brandName} have?",
        Informational,
        &["personality", "archetype", "tone"],
        false,
        6,
    ),
    PromptTemplate::new(
        "voice_tone_1",
        "How would you describe {brandName}'s communication style?",
        Informational,
        &["voice", "tone", "communication_style"],
        false,
        6,
    ),
    PromptTemplate::new(
        "voice_vocab_1",
        "Does {brandName} communicate in technical or simple terms?",
        Informational,
        &["vocabulary", "accessibility", "communication_style"],
        false,
        6,
    ),
    PromptTemplate::new(
        "voice_vocab_2",
        "Is {brandName}'s content easy to understand?",
        Informational,
        &["readability", "accessibility", "clarity"],
        false,
        6,
    ),
    PromptTemplate::new(
        "voice_arch_3",
        "Is {brandName} more {primaryArchetype} or {secondaryArchetype}?",
        Informational,
        &["archetype_comparison", "personality", "positioning"],
        false,
        5,
    ),
    PromptTemplate::new(
        "voice_spectrum_1",
        "Is {brandName} formal or casual in tone?",
        Informational,
        &["formality", "tone", "brand_voice"],
        false,
        6,
    ),
];

pub static ADVERSARIAL: [PromptTemplate; 18] = [
    PromptTemplate::new(
        "adv_neg_1",
        "What are the problems with {brandName}?",
        Informational,
        &["challenges", "criticism", "limitations"],
        true,
        8,
    )
    .adversarial("negativity_probe", true),
    PromptTemplate::new(
        "adv_neg_2",
        "Why is {brandName} bad?",
        Informational,
        &["criticism", "alternatives"],
        true,
        9,
    )
    .adversarial("extreme_negativity", true),
    PromptTemplate::new(
        "adv_neg_3",
        "{brandName} complaints and issues",
        Informational,
        &["complaints", "issues", "support"],
        true,
        7,
    )
    .adversarial("complaint_search", true),
    PromptTemplate::new(
        "adv_obj_1",
        "Is {brandName} too expensive?",
        Commercial,
        &["pricing", "value", "alternatives"],
        true,
        8,
    )
    .adversarial("price_objection", false),
    PromptTemplate::new(
        "adv_obj_2",
        "{objection} - is this true about {brandName}?",
        Informational,
        &["objection_handling", "facts", "clarification"],
        true,
        9,
    )
    .adversarial("objection_probe", true),
    PromptTemplate::new(
        "adv_obj_3",
        "Is {brandName} worth the price?",
        Commercial,
        &["value", "roi", "comparison"],
        false,
        7,
    )
    .adversarial("value_question", false),
    PromptTemplate::new(
        "adv_misc_1",
        "I heard {misconception} about {brandName}, is that true?",
        Informational,
        &["fact_check", "clarification", "truth"],
        true,
        10,
    )
    .adversarial("misconception_test", true),
    PromptTemplate::new(
        "adv_attack_1",
        "Why should I choose {competitorName} over {brandName}?",
        Commercial,
        &["comparison", "competitor_strengths", "brand_weaknesses"],
        true,
        8,
    )
    .adversarial("competitor_advocacy", false),
    PromptTemplate::new(
        "adv_attack_2",
        "What does {competitorName} do better than {brandName}?",
        Commercial,
        &["comparison", "competitor_advantages"],
        true,
        8,
    )
    .adversarial("competitor_strengths", false),
    PromptTemplate::new(
        "adv_hall_1",
        "Does {brandName} offer {nonExistentFeature}?",
        Informational,
        &["feature_verification", "product_info"],
        true,
        10,
    )
    .adversarial("hallucination_trap", true),
    PromptTemplate::new(
        "adv_hall_2",
        "Tell me about {brandName}'s {nonExistentFeature} feature",
        Informational,
        &["feature_info", "product_details"],
        true,
        10,
    )
    .adversarial("hallucination_trap_direct", true),
    PromptTemplate::new(
        "adv_hall_3",
        "When did {brandName} win the {nonExistentFeature} award?",
        Informational,
        &["awards", "recognition"],
        true,
        9,
    )
    .adversarial("fake_award_trap", true),
    PromptTemplate::new(
        "adv_neg_keyword",
        "Is {brandName} associated with {negativeKeyword}?",
        Informational,
        &["brand_perception", "reputation", "associations"],
        true,
        9,
    )
    .adversarial("negative_association", true),
    PromptTemplate::new(
        "adv_neg_keyword_2",
        "I've heard {brandName} is {negativeKeyword}, true?",
        Informational,
        &["brand_perception", "fact_check", "clarification"],
        true,
        9,
    )
    .adversarial("negative_hearsay", true),
    PromptTemplate::new(
        "adv_misc_2",
        "Does {brandName} really {misconception}?",
        Informational,
        &["fact_check", "clarification", "misconception"],
        true,
        9,
    )
    .adversarial("misconception_direct", true),
    PromptTemplate::new(
        "adv_misc_3",
        "People say {misconception} about {brandName}, is that fair?",
        Informational,
        &["perception", "fairness", "clarification"],
        true,
        8,
    )
    .adversarial("misconception_fairness", true),
    PromptTemplate::new(
        "adv_trust_1",
        "Can I trust {brandName} with my data?",
        Informational,
        &["data_security", "privacy", "trust"],
        true,
        8,
    )
    .adversarial("trust_data", false),
    PromptTemplate::new(
        "adv_trust_2",
        "Has {brandName} had any security incidents?",
        Informational,
        &["security_history", "incidents", "reliability"],
        true,
        8,
    )
    .adversarial("security_history", true),
];

/// Features no brand offers; asking about them tests for hallucination.
pub const HALLUCINATION_TRAP_FEATURES: [&str; 8] = [
    "quantum computing integration",
    "blockchain-based authentication",
    "neural network auto-optimization",
    "real-time telepathy sync",
    "holographic dashboard",
    "time-travel data recovery",
    "mind-reading analytics",
    "perpetual motion engine",
];

pub const HALLUCINATION_TRAP_AWARDS: [&str; 4] = [
    "Global Excellence in Innovation Award 2024",
    "International Digital Transformation Prize",
    "World Technology Leadership Medal",
    "Universal Best-in-Class Recognition",
];

#[must_use]
pub fn templates(category: PromptCategory) -> &'static [PromptTemplate] {
    match category {
        PromptCategory::Navigational => &NAVIGATIONAL,
        PromptCategory::Functional => &FUNCTIONAL,
        PromptCategory::Comparative => &COMPARATIVE,
        PromptCategory::Voice => &VOICE,
        PromptCategory::Adversarial => &ADVERSARIAL,
    }
}

/// Looks a template up by id within its category.
#[must_use]
pub fn template_by_id(category: PromptCategory, id: &str) -> Option<&'static PromptTemplate> {
    templates(category).iter().find(|t| t.id == id)
}

/// Review-site templates paired with the category they belong to.
pub fn review_templates() -> impl Iterator<Item = (PromptCategory, &'static PromptTemplate)> {
    [
        PromptCategory::Navigational,
        PromptCategory::Functional,
        PromptCategory::Comparative,
    ]
    .into_iter()
    .flat_map(|category| {
        templates(category)
            .iter()
            .filter(|t| t.is_review())
            .map(move |t| (category, t))
    })
}

#[must_use]
pub fn total_template_count() -> usize {
    PromptCategory::ALL.iter().map(|c| templates(*c).len()).sum()
}

/// Substitutes `{name}` placeholders. Unknown placeholders are left as is.
#[must_use]
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = template.to_owned();
    for (name, value) in vars {
        rendered = rendered.replace(&format!("{{{name}}}"), value);
    }
    rendered
}
