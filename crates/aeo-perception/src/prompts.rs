//! Persisting generated prompts.

use aeo_db::NewPrompt;
use aeo_prompts::{GeneratedPrompt, GenerationResult, GeneratorOptions};
use sqlx::PgPool;

use crate::error::PerceptionError;
use crate::ground_truth::BrandKnowledge;

#[must_use]
pub fn to_new_prompt(prompt: &GeneratedPrompt) -> NewPrompt {
    NewPrompt {
        template_id: prompt.template_id.to_string(),
        category: prompt.category.to_string(),
        intent: prompt.intent.to_string(),
        prompt_text: prompt.text.clone(),
        priority: prompt.priority,
        expected_themes: prompt.expected_themes.clone(),
        expected_citations: prompt.expected_citations,
        adversarial_twist: prompt.adversarial_twist.map(str::to_string),
        is_hallucination_test: prompt.hallucination_test,
        target_persona: prompt.target_persona.clone(),
        target_competitor: prompt.target_competitor.clone(),
        target_product: prompt.target_product.clone(),
        target_claim: prompt.target_claim.clone(),
        expected_tone: prompt.expected_tone.clone(),
        expected_vocabulary: prompt.expected_vocabulary.clone(),
    }
}

/// Generates prompts from what is known about the brand and upserts them.
/// Prompts already stored with the same text are reactivated.
///
/// # Errors
///
/// Returns [`PerceptionError::Db`] if the upsert fails.
pub async fn generate_and_store(
    pool: &PgPool,
    knowledge: &BrandKnowledge,
    options: &GeneratorOptions,
) -> Result<GenerationResult, PerceptionError> {
    let result = aeo_prompts::generate(&knowledge.generation_context(), options);
    let rows: Vec<NewPrompt> = result.prompts.iter().map(to_new_prompt).collect();
    let written = aeo_db::upsert_prompts(pool, knowledge.brand.id, &rows).await?;

    tracing::info!(
        brand = %knowledge.brand.slug,
        generated = result.total,
        written,
        "prompts stored"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aeo_prompts::GenerationContext;

    #[test]
    fn conversion_keeps_targets_and_flags() {
        let context = GenerationContext {
            brand_name: "Acme".to_string(),
            ..GenerationContext::default()
        };
        let result = aeo_prompts::generate(&context, &GeneratorOptions::default());
        let trap = result
            .prompts
            .iter()
            .find(|p| p.category == aeo_core::PromptCategory::Adversarial)
            .expect("adversarial prompts need only a brand name");

        let row = to_new_prompt(trap);
        assert_eq!(row.category, "adversarial");
        assert_eq!(row.is_hallucination_test, trap.hallucination_test);
        assert_eq!(row.prompt_text, trap.text);
        assert_eq!(row.template_id, trap.template_id);
        assert_eq!(row.adversarial_twist.as_deref(), trap.adversarial_twist);
    }
}
