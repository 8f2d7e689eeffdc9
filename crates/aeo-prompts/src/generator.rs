//! Renders the template catalog against a brand's context.

use std::collections::HashSet;

use aeo_core::{PromptCategory, PromptIntent};
use serde::{Deserialize, Serialize};

use crate::context::{CompetitorInput, GenerationContext};
use crate::templates::{
    render, review_templates, template_by_id, templates, PromptTemplate,
    HALLUCINATION_TRAP_AWARDS, HALLUCINATION_TRAP_FEATURES, REVIEW_LABEL,
};

pub const DEFAULT_MAX_PER_CATEGORY: usize = 15;
const MAX_REVIEW_SITES: usize = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorOptions {
    pub categories: Vec<PromptCategory>,
    pub max_per_category: usize,
    pub review_sites: Vec<String>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            categories: PromptCategory::ALL.to_vec(),
            max_per_category: DEFAULT_MAX_PER_CATEGORY,
            review_sites: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedPrompt {
    pub template_id: &'static str,
    pub category: PromptCategory,
    pub category_label: &'static str,
    pub intent: PromptIntent,
    pub template: &'static str,
    pub text: String,
    pub expected_themes: Vec<String>,
    pub expected_entities: Vec<String>,
    pub expected_citations: bool,
    pub adversarial_twist: Option<&'static str>,
    pub hallucination_test: bool,
    pub priority: i32,
    pub target_persona: Option<String>,
    pub target_competitor: Option<String>,
    pub target_product: Option<String>,
    pub target_claim: Option<String>,
    pub target_review_site: Option<String>,
    pub expected_tone: Option<String>,
    pub expected_vocabulary: Option<String>,
}

impl GeneratedPrompt {
    fn from_template(
        category: PromptCategory,
        template: &'static PromptTemplate,
        text: String,
        brand_name: &str,
    ) -> Self {
        Self {
            template_id: template.id,
            category,
            category_label: category.label(),
            intent: template.intent,
            template: template.text,
            text,
            expected_themes: template
                .expected_themes
                .iter()
                .map(|t| (*t).to_owned())
                .collect(),
            expected_entities: vec![brand_name.to_owned()],
            expected_citations: template.expected_citations,
            adversarial_twist: template.adversarial_twist,
            hallucination_test: template.hallucination_test,
            priority: i32::from(template.priority),
            target_persona: None,
            target_competitor: None,
            target_product: None,
            target_claim: None,
            target_review_site: None,
            expected_tone: None,
            expected_vocabulary: None,
        }
    }

    fn weighted(mut self, multiplier: f64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let weighted = (f64::from(self.priority) * multiplier).round() as i32;
        self.priority = weighted;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: PromptCategory,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub prompts: Vec<GeneratedPrompt>,
    pub category_breakdown: Vec<CategoryCount>,
    pub total: usize,
    pub personas_covered: Vec<String>,
    pub competitors_covered: Vec<String>,
    pub products_covered: Vec<String>,
    pub review_sites_covered: Vec<String>,
}

/// Generates prompts for every requested category.
///
/// Each category is deduplicated by rendered text, sorted by priority
/// (highest first, ties keep generation order) and cut to
/// `max_per_category`. Review-site prompts are appended to their parent
/// category after the cut.
#[must_use]
pub fn generate(context: &GenerationContext, options: &GeneratorOptions) -> GenerationResult {
    let mut prompts = Vec::new();
    let mut category_breakdown = Vec::new();

    for category in &options.categories {
        let mut batch = match category {
            PromptCategory::Navigational => navigational(context),
            PromptCategory::Functional => functional(context),
            PromptCategory::Comparative => comparative(context),
            PromptCategory::Voice => voice(context),
            PromptCategory::Adversarial => adversarial(context),
        };
        batch = finalize(batch);
        batch.truncate(options.max_per_category);

        category_breakdown.push(CategoryCount {
            category: *category,
            label: category.label(),
            count: batch.len(),
        });
        prompts.extend(batch);
    }

    let review = finalize(review_site_prompts(context, options));
    for prompt in &review {
        if let Some(entry) = category_breakdown
            .iter_mut()
            .find(|c| c.category == prompt.category)
        {
            entry.count += 1;
        }
    }
    prompts.extend(review);

    let result = GenerationResult {
        total: prompts.len(),
        personas_covered: covered(&prompts, |p| p.target_persona.as_deref()),
        competitors_covered: covered(&prompts, |p| p.target_competitor.as_deref()),
        products_covered: covered(&prompts, |p| p.target_product.as_deref()),
        review_sites_covered: covered(&prompts, |p| p.target_review_site.as_deref()),
        prompts,
        category_breakdown,
    };
    tracing::debug!(
        brand = %context.brand_name,
        total = result.total,
        "prompts generated"
    );
    result
}

fn finalize(prompts: Vec<GeneratedPrompt>) -> Vec<GeneratedPrompt> {
    let mut seen = HashSet::new();
    let mut unique: Vec<GeneratedPrompt> = prompts
        .into_iter()
        .filter(|p| seen.insert(p.text.clone()))
        .collect();
    unique.sort_by(|a, b| b.priority.cmp(&a.priority));
    unique
}

fn covered(
    prompts: &[GeneratedPrompt],
    target: impl Fn(&GeneratedPrompt) -> Option<&str>,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in prompts.iter().filter_map(target) {
        if !out.iter().any(|n| n == name) {
            out.push(name.to_owned());
        }
    }
    out
}

fn matching(
    category: PromptCategory,
    pred: impl Fn(&str) -> bool,
) -> impl Iterator<Item = &'static PromptTemplate> {
    templates(category)
        .iter()
        .filter(move |t| !t.is_review() && pred(t.id))
}

fn unique_first<'a>(values: impl Iterator<Item = &'a String>, limit: usize) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for value in values {
        if out.len() == limit {
            break;
        }
        if !out.contains(&value.as_str()) {
            out.push(value);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Navigational: "The Who"
// ---------------------------------------------------------------------------

fn navigational(ctx: &GenerationContext) -> Vec<GeneratedPrompt> {
    const CAT: PromptCategory = PromptCategory::Navigational;
    let brand = ctx.brand_name.as_str();
    let industry = ctx
        .industry
        .as_deref()
        .filter(|i| !i.trim().is_empty())
        .unwrap_or("technology");
    let mut out = Vec::new();

    for t in matching(CAT, |id| !id.contains("product") && !id.contains("industry")) {
        out.push(GeneratedPrompt::from_template(
            CAT,
            t,
            render(t.text, &[("brandName", brand)]),
            brand,
        ));
    }
    for t in matching(CAT, |id| id.contains("industry")) {
        out.push(GeneratedPrompt::from_template(
            CAT,
            t,
            render(t.text, &[("brandName", brand), ("industry", industry)]),
            brand,
        ));
    }

    let heroes: Vec<_> = ctx.products.iter().filter(|p| p.is_hero).collect();
    let products = if heroes.is_empty() {
        ctx.products.iter().take(3).collect()
    } else {
        heroes
    };
    for product in products {
        for t in matching(CAT, |id| id.contains("product")) {
            let mut prompt = GeneratedPrompt::from_template(
                CAT,
                t,
                render(
                    t.text,
                    &[("brandName", brand), ("productName", product.name.as_str())],
                ),
                brand,
            );
            prompt.target_product = Some(product.name.clone());
            out.push(prompt);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Functional: "The How"
// ---------------------------------------------------------------------------

fn functional(ctx: &GenerationContext) -> Vec<GeneratedPrompt> {
    const CAT: PromptCategory = PromptCategory::Functional;
    let brand = ctx.brand_name.as_str();
    let category = ctx.product_category();
    let primary_name = ctx.primary_product().map_or(brand, |p| p.name.as_str());
    let mut out = Vec::new();

    for persona in &ctx.personas {
        let multiplier = persona.multiplier();
        let mut push = |t: &'static PromptTemplate, text: String| {
            let mut prompt =
                GeneratedPrompt::from_template(CAT, t, text, brand).weighted(multiplier);
            prompt.target_persona = Some(persona.name.clone());
            out.push(prompt);
        };

        for pain in persona.pain_points.iter().take(3) {
            for t in matching(CAT, |id| id.contains("pain")) {
                push(
                    t,
                    render(
                        t.text,
                        &[
                            ("brandName", brand),
                            ("painPoint", pain.as_str()),
                            ("productCategory", category),
                        ],
                    ),
                );
            }
        }
        for goal in persona.goals.iter().take(3) {
            for t in matching(CAT, |id| id.contains("goal")) {
                push(
                    t,
                    render(
                        t.text,
                        &[
                            ("brandName", brand),
                            ("goal", goal.as_str()),
                            ("productCategory", category),
                        ],
                    ),
                );
            }
        }
        if let Some(t) = template_by_id(CAT, "func_question_1") {
            for question in persona.common_questions.iter().take(2) {
                push(t, question.clone());
            }
        }
        let description = persona
            .description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or(&persona.name);
        for t in matching(CAT, |id| id.contains("journey")) {
            push(
                t,
                render(
                    t.text,
                    &[
                        ("brandName", brand),
                        ("personaDescription", description),
                        ("productName", primary_name),
                    ],
                ),
            );
        }
    }

    let use_cases = unique_first(ctx.products.iter().flat_map(|p| &p.use_cases), 4);
    for use_case in use_cases {
        for t in matching(CAT, |id| id.contains("usecase")) {
            out.push(GeneratedPrompt::from_template(
                CAT,
                t,
                render(
                    t.text,
                    &[("brandName", brand), ("useCase", use_case), ("productCategory", category)],
                ),
                brand,
            ));
        }
    }

    for (kind, placeholder) in [("feature", "feature"), ("benefit", "benefit")] {
        for product in ctx.products.iter().take(2) {
            let values = if kind == "feature" {
                &product.features
            } else {
                &product.benefits
            };
            for value in values.iter().take(2) {
                for t in matching(CAT, |id| id.contains(kind)) {
                    let mut prompt = GeneratedPrompt::from_template(
                        CAT,
                        t,
                        render(
                            t.text,
                            &[
                                ("brandName", brand),
                                ("productName", product.name.as_str()),
                                (placeholder, value.as_str()),
                            ],
                        ),
                        brand,
                    );
                    prompt.target_product = Some(product.name.clone());
                    out.push(prompt);
                }
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Comparative: "The Which"
// ---------------------------------------------------------------------------

/// Competitors ordered by threat, most threatening first.
fn by_threat(competitors: &[CompetitorInput]) -> Vec<&CompetitorInput> {
    let mut sorted: Vec<&CompetitorInput> = competitors.iter().collect();
    sorted.sort_by(|a, b| b.multiplier().total_cmp(&a.multiplier()));
    sorted
}

fn comparative(ctx: &GenerationContext) -> Vec<GeneratedPrompt> {
    const CAT: PromptCategory = PromptCategory::Comparative;
    let brand = ctx.brand_name.as_str();
    let category = ctx.product_category();
    let use_case = ctx
        .primary_product()
        .and_then(|p| p.use_cases.first())
        .map_or("business needs", String::as_str);
    let sorted = by_threat(&ctx.competitors);
    let mut out = Vec::new();

    for competitor in sorted.iter().take(5) {
        let multiplier = competitor.multiplier();
        let direct = matching(CAT, |id| {
            id.starts_with("comp_") && !id.contains("alt") && !id.contains("claim")
        });
        let alternatives = matching(CAT, |id| id.contains("alt"));
        for t in direct.chain(alternatives) {
            let text = render(
                t.text,
                &[
                    ("brandName", brand),
                    ("competitorName", competitor.name.as_str()),
                    ("productCategory", category),
                    ("useCase", use_case),
                ],
            );
            let mut prompt =
                GeneratedPrompt::from_template(CAT, t, text, brand).weighted(multiplier);
            prompt.target_competitor = Some(competitor.name.clone());
            out.push(prompt);
        }
    }

    let top = sorted.first().map_or("competitors", |c| c.name.as_str());
    for claim in ctx.claims.iter().take(2) {
        for t in matching(CAT, |id| id.contains("claim")) {
            let text = render(
                t.text,
                &[
                    ("brandName", brand),
                    ("claim", claim.as_str()),
                    ("productCategory", category),
                    ("competitorName", top),
                ],
            );
            let mut prompt = GeneratedPrompt::from_template(CAT, t, text, brand);
            prompt.target_claim = Some(claim.clone());
            out.push(prompt);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Voice: "The Vibe"
// ---------------------------------------------------------------------------

fn voice(ctx: &GenerationContext) -> Vec<GeneratedPrompt> {
    const CAT: PromptCategory = PromptCategory::Voice;
    let brand = ctx.brand_name.as_str();
    let secondary = ctx
        .secondary_archetype
        .as_deref()
        .filter(|a| !a.trim().is_empty());
    let primary = ctx
        .primary_archetype
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or("innovative");
    let vocabulary = ctx.vocabulary_level.as_deref().unwrap_or("professional");

    templates(CAT)
        .iter()
        .filter(|t| t.id != "voice_arch_3" || secondary.is_some())
        .map(|t| {
            let text = render(
                t.text,
                &[
                    ("brandName", brand),
                    ("archetype", primary),
                    ("primaryArchetype", primary),
                    ("secondaryArchetype", secondary.unwrap_or("expert")),
                ],
            );
            let mut prompt = GeneratedPrompt::from_template(CAT, t, text, brand);
            prompt.expected_tone.clone_from(&ctx.primary_tone);
            if t.id.contains("vocab") {
                prompt.expected_vocabulary = Some(vocabulary.to_owned());
            }
            prompt
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Adversarial: "The Risk"
// ---------------------------------------------------------------------------

fn adversarial(ctx: &GenerationContext) -> Vec<GeneratedPrompt> {
    const CAT: PromptCategory = PromptCategory::Adversarial;
    let brand = ctx.brand_name.as_str();
    let mut out = Vec::new();
    let mut push = |t: &'static PromptTemplate, vars: &[(&str, &str)]| {
        out.push(GeneratedPrompt::from_template(CAT, t, render(t.text, vars), brand));
    };

    for t in matching(CAT, |id| id.starts_with("adv_neg_") && !id.contains("keyword")) {
        push(t, &[("brandName", brand)]);
    }
    for keyword in ctx.negative_keywords.iter().take(3) {
        for t in matching(CAT, |id| id.contains("neg_keyword")) {
            push(t, &[("brandName", brand), ("negativeKeyword", keyword.as_str())]);
        }
    }
    let objections = unique_first(ctx.personas.iter().flat_map(|p| &p.objections), 4);
    for objection in objections {
        for t in matching(CAT, |id| id.contains("obj")) {
            push(t, &[("brandName", brand), ("objection", objection)]);
        }
    }
    for misconception in ctx.misconceptions.iter().take(3) {
        for t in matching(CAT, |id| id.contains("misc")) {
            push(t, &[("brandName", brand), ("misconception", misconception.as_str())]);
        }
    }
    for t in matching(CAT, |id| id.contains("trust")) {
        push(t, &[("brandName", brand)]);
    }
    for feature in HALLUCINATION_TRAP_FEATURES.iter().take(2) {
        for t in matching(CAT, |id| id == "adv_hall_1" || id == "adv_hall_2") {
            push(t, &[("brandName", brand), ("nonExistentFeature", *feature)]);
        }
    }
    if let (Some(award), Some(t)) = (
        HALLUCINATION_TRAP_AWARDS.first(),
        template_by_id(CAT, "adv_hall_3"),
    ) {
        push(t, &[("brandName", brand), ("nonExistentFeature", *award)]);
    }

    for competitor in ctx.competitors.iter().take(2) {
        for t in matching(CAT, |id| id.contains("attack")) {
            let text = render(
                t.text,
                &[("brandName", brand), ("competitorName", competitor.name.as_str())],
            );
            let mut prompt = GeneratedPrompt::from_template(CAT, t, text, brand);
            prompt.target_competitor = Some(competitor.name.clone());
            out.push(prompt);
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Review sites: "The Trust"
// ---------------------------------------------------------------------------

fn review_site_prompts(
    ctx: &GenerationContext,
    options: &GeneratorOptions,
) -> Vec<GeneratedPrompt> {
    let brand = ctx.brand_name.as_str();
    let top_competitor = ctx.competitors.first().map(|c| c.name.as_str());
    let use_case = ctx
        .primary_product()
        .and_then(|p| p.use_cases.first())
        .map_or("business needs", String::as_str);
    let sites = options
        .review_sites
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(MAX_REVIEW_SITES);

    let mut out = Vec::new();
    for site in sites {
        for (category, t) in review_templates() {
            if !options.categories.contains(&category) {
                continue;
            }
            let is_comparison = t.id.starts_with("comp_");
            if is_comparison && top_competitor.is_none() {
                continue;
            }
            let text = render(
                t.text,
                &[
                    ("brandName", brand),
                    ("reviewSite", site),
                    ("competitorName", top_competitor.unwrap_or_default()),
                    ("useCase", use_case),
                ],
            );
            let mut prompt = GeneratedPrompt::from_template(category, t, text, brand);
            prompt.category_label = REVIEW_LABEL;
            prompt.target_review_site = Some(site.to_owned());
            prompt.expected_entities.push(site.to_owned());
            if is_comparison {
                if let Some(competitor) = top_competitor {
                    prompt.target_competitor = Some(competitor.to_owned());
                    prompt.expected_entities.push(competitor.to_owned());
                }
            }
            out.push(prompt);
        }
    }
    out
}

#[cfg(test)]
#[path = "generator_test.rs"]
mod tests;
