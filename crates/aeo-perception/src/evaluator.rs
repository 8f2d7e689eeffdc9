//! LLM-as-judge scoring of platform responses.

use aeo_core::AppConfig;
use aeo_db::PromptRow;
use aeo_llm::{ChatMessage, ChatRequest, OpenAiClient};
use serde_json::Value;

use crate::error::PerceptionError;
use crate::ground_truth::GroundTruth;
use crate::metrics::EvaluationMetrics;

pub const EVALUATOR_MODEL: &str = "gpt-4o-mini";
const EVALUATOR_TEMPERATURE: f32 = 0.1;
const EVALUATOR_SYSTEM: &str =
    "You are an expert AI response evaluator. Always respond with valid JSON only.";

const EVALUATION_TEMPLATE: &str = r#"You are an expert AI response evaluator. Analyze this response comprehensively.

BRAND: {brandName}
COMPETITORS: {competitors}

GROUND TRUTH:
{groundTruth}

BRAND VOICE PROFILE:
{voiceProfile}

PROMPT:
{prompt}

RESPONSE TO EVALUATE:
---
{response}
---

IS HALLUCINATION TRAP: {isHallucinationTrap}

Return a comprehensive JSON evaluation:
{
  "faithfulness": {
    "score": 0-100,
    "errors": [],
    "rationale": ""
  },
  "shareOfVoice": {
    "score": 0-100,
    "brandMentioned": true|false,
    "brandPosition": number|null,
    "competitorsMentioned": [],
    "rationale": ""
  },
  "sentiment": {
    "overall": -1 to 1,
    "label": "very_negative|negative|neutral|positive|very_positive",
    "aspects": {},
    "rationale": ""
  },
  "voiceAlignment": {
    "score": 0-100,
    "deviations": [],
    "rationale": ""
  },
  "hallucination": {
    "score": 0-100,
    "detected": [],
    "passedTrapTest": true|false,
    "rationale": ""
  },
  "overallScore": 0-100,
  "keyThemes": [],
  "missingInformation": [],
  "opportunities": [],
  "summary": "2-3 sentence summary"
}

Overall score = weighted average:
- Faithfulness: 25%
- Share of Voice: 25%
- Sentiment: 15%
- Voice Alignment: 15%
- Hallucination: 20%"#;

/// What the judge needs to know about the prompt that produced a response.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub prompt_text: String,
    pub hallucination_test: bool,
    pub adversarial_twist: Option<String>,
    pub expected_themes: Vec<String>,
    pub expected_tone: Option<String>,
}

impl From<&PromptRow> for PromptContext {
    fn from(row: &PromptRow) -> Self {
        Self {
            prompt_text: row.prompt_text.clone(),
            hallucination_test: row.is_hallucination_test,
            adversarial_twist: row.adversarial_twist.clone(),
            expected_themes: row.expected_themes.clone(),
            expected_tone: row.expected_tone.clone(),
        }
    }
}

/// Decoded metrics together with the raw judge output they came from.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub metrics: EvaluationMetrics,
    pub raw: Value,
}

pub struct Evaluator {
    client: OpenAiClient,
    model: String,
}

impl Evaluator {
    #[must_use]
    pub fn new(client: OpenAiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// # Errors
    ///
    /// Returns [`PerceptionError::Llm`] if `OPENAI_API_KEY` is not configured.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, PerceptionError> {
        Ok(Self::new(OpenAiClient::from_app_config(config)?, EVALUATOR_MODEL))
    }

    /// Scores `response` against the brand's ground truth.
    ///
    /// # Errors
    ///
    /// Returns [`PerceptionError::Llm`] if the judge call fails or its reply
    /// is not JSON even after repair.
    pub async fn evaluate(
        &self,
        prompt: &PromptContext,
        response: &str,
        truth: &GroundTruth,
    ) -> Result<Evaluation, PerceptionError> {
        let request = ChatRequest::new(
            self.model.clone(),
            vec![
                ChatMessage::system(EVALUATOR_SYSTEM),
                ChatMessage::user(build_evaluation_prompt(prompt, response, truth)),
            ],
        )
        .temperature(EVALUATOR_TEMPERATURE);

        let raw: Value = self.client.chat_json(request, "perception evaluation").await?;
        Ok(Evaluation {
            metrics: EvaluationMetrics::from_judge(&raw),
            raw,
        })
    }
}

/// Fills the judge template. The response is substituted last so text
/// inside it is never treated as a placeholder.
#[must_use]
pub fn build_evaluation_prompt(
    prompt: &PromptContext,
    response: &str,
    truth: &GroundTruth,
) -> String {
    let competitors = if truth.competitors.is_empty() {
        "None specified".to_string()
    } else {
        truth.competitors.join(", ")
    };
    let trap = if prompt.hallucination_test { "YES" } else { "NO" };

    EVALUATION_TEMPLATE
        .replace("{brandName}", &truth.brand_name)
        .replace("{competitors}", &competitors)
        .replace("{groundTruth}", &truth.format_facts())
        .replace("{voiceProfile}", &truth.format_voice())
        .replace("{isHallucinationTrap}", trap)
        .replace("{prompt}", &prompt.prompt_text)
        .replace("{response}", response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truth() -> GroundTruth {
        GroundTruth {
            brand_name: "Acme".to_string(),
            competitors: vec!["Tableau".to_string(), "Looker".to_string()],
            ..GroundTruth::default()
        }
    }

    #[test]
    fn prompt_carries_brand_competitors_and_trap_flag() {
        let ctx = PromptContext {
            prompt_text: "Does Acme have blockchain integration?".to_string(),
            hallucination_test: true,
            ..PromptContext::default()
        };
        let text = build_evaluation_prompt(&ctx, "No, it does not.", &truth());
        assert!(text.contains("BRAND: Acme"));
        assert!(text.contains("COMPETITORS: Tableau, Looker"));
        assert!(text.contains("IS HALLUCINATION TRAP: YES"));
        assert!(text.contains("---\nNo, it does not.\n---"));
        assert!(text.contains("No specific voice profile defined"));
    }

    #[test]
    fn missing_competitors_are_called_out() {
        let truth = GroundTruth {
            brand_name: "Acme".to_string(),
            ..GroundTruth::default()
        };
        let text = build_evaluation_prompt(&PromptContext::default(), "", &truth);
        assert!(text.contains("COMPETITORS: None specified"));
        assert!(text.contains("IS HALLUCINATION TRAP: NO"));
    }

    #[test]
    fn response_placeholders_are_not_expanded() {
        let text = build_evaluation_prompt(&PromptContext::default(), "{brandName}", &truth());
        assert!(text.contains("---\n{brandName}\n---"));
    }
}
