//! Fix suggestions for perception problems.
//!
//! Each insight maps to a [`ProblemType`]; the generator then asks the LLM
//! for up to four kinds of fix (Schema.org JSON-LD, FAQ entries, a content
//! recommendation, and for urgent problems a Wikipedia edit). A failed fix
//! is logged and left out; the plan carries whatever succeeded.

use std::sync::LazyLock;

use aeo_core::{AppConfig, Effort, FixType, InsightCategory, InsightPriority, ProblemType};
use aeo_db::{InsightRow, NewCorrection};
use aeo_llm::{strip_code_fences, ChatMessage, ChatRequest, LlmError, OpenAiClient};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PerceptionError;
use crate::ground_truth::GroundTruth;

pub const CORRECTION_MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS: u32 = 1_500;
const FAQ_SEED_QUESTIONS: usize = 3;

static JSON_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[\s\S]*\]").expect("valid regex"));
static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("valid regex"));

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

const SCHEMA_ORG_SYSTEM: &str =
    "You are a Schema.org expert. Generate valid, well-formed JSON-LD structured data.";
const FAQ_SYSTEM: &str =
    "You are a content strategist specializing in FAQ optimization for SEO and AI readability.";
const CONTENT_SYSTEM: &str =
    "You are a brand content strategist. Create actionable content recommendations.";
const WIKIPEDIA_SYSTEM: &str = "You are a Wikipedia editor. Suggest edits that comply with \
     Wikipedia policies (NPOV, verifiability, no original research).";

const SCHEMA_ORG_PROMPT: &str = "You are a Schema.org expert. Generate valid JSON-LD structured data for an organization based on the following context.

Brand Information:
{brandContext}

Problem Type: {problemType}
Issue Description: {issueDescription}

Generate a complete, valid Schema.org JSON-LD snippet that addresses the issue. Use only factual information from the brand context.

Respond with ONLY the JSON-LD code, no explanations.";

const FAQ_PROMPT: &str = r#"You are a content strategist. Generate FAQ content for a brand's website that addresses specific perception issues.

Brand Information:
{brandContext}

Problem Type: {problemType}
Issue Description: {issueDescription}
Misconceptions to Address: {misconceptions}

Generate 3-5 FAQ items in the following JSON format:
[
  {
    "question": "...",
    "answer": "..."
  }
]

Make answers factual, clear, and SEO-optimized. Use natural language."#;

const CONTENT_PROMPT: &str = r#"You are a brand content strategist. Generate website content recommendations that address perception issues.

Brand Information:
{brandContext}

Problem Type: {problemType}
Issue Description: {issueDescription}

Generate a content recommendation with:
1. Section title
2. Suggested headline
3. Content outline (3-5 bullet points)
4. Key messages to include
5. Tone guidance

Format as JSON:
{
  "sectionTitle": "...",
  "headline": "...",
  "outline": [...],
  "keyMessages": [...],
  "toneGuidance": "..."
}"#;

const WIKIPEDIA_PROMPT: &str = r#"You are a Wikipedia editor providing guidance. Based on the following brand information and perception issues, suggest Wikipedia edits.

Brand Information:
{brandContext}

Problem Type: {problemType}
Issue Description: {issueDescription}

Generate edit suggestions following Wikipedia's policies (NPOV, verifiability, no original research).

Format as:
{
  "suggestedEdits": [...],
  "sourcesNeeded": [...],
  "existingClaimsToUpdate": [...],
  "notes": "..."
}"#;

/// Questions a brand's FAQ typically needs for each kind of problem.
fn faq_questions(problem: ProblemType) -> &'static [&'static str] {
    match problem {
        ProblemType::Hallucination => &[
            "What products/services does {brandName} NOT offer?",
            "Which commonly repeated claims about {brandName} are false?",
            "What is {brandName}'s actual founding story?",
            "Does {brandName} have features it is often credited with?",
        ],
        ProblemType::MissingInfo => &[
            "What does {brandName} do?",
            "Who founded {brandName} and when?",
            "Where is {brandName} located?",
            "What products/services does {brandName} offer?",
            "Who are {brandName}'s typical customers?",
        ],
        ProblemType::WrongSentiment => &[
            "What do customers say about {brandName}?",
            "How does {brandName} handle customer issues?",
            "What makes {brandName} trustworthy?",
            "What is {brandName}'s commitment to quality?",
        ],
        ProblemType::CompetitorConfusion => &[
            "What makes {brandName} different from {competitorName}?",
            "Is {brandName} the same as {competitorName}?",
            "Why choose {brandName} over alternatives?",
            "What is {brandName}'s specialty?",
        ],
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionSuggestion {
    pub fix_type: FixType,
    pub title: String,
    pub description: String,
    pub content: String,
    pub priority: InsightPriority,
    pub effort: Effort,
    pub estimated_impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrectionPlan {
    pub problem_type: ProblemType,
    pub problem_description: String,
    pub affected_platforms: Vec<String>,
    pub suggestions: Vec<CorrectionSuggestion>,
}

impl CorrectionPlan {
    /// The content of the first suggestion of `fix_type`, if one was produced.
    #[must_use]
    pub fn content_for(&self, fix_type: FixType) -> Option<&str> {
        self.suggestions
            .iter()
            .find(|s| s.fix_type == fix_type)
            .map(|s| s.content.as_str())
    }

    /// Builds the workflow row for this plan.
    ///
    /// # Errors
    ///
    /// Returns [`PerceptionError::Json`] if the suggestions cannot be serialized.
    pub fn to_new_correction(
        &self,
        insight: &InsightRow,
        pre_fix_score: Option<i32>,
    ) -> Result<NewCorrection, PerceptionError> {
        Ok(NewCorrection {
            brand_id: insight.brand_id,
            insight_id: Some(insight.id),
            scan_id: insight.scan_id,
            problem_type: self.problem_type.to_string(),
            priority: self.problem_type.priority().to_string(),
            title: insight.title.clone(),
            description: self.problem_description.clone(),
            suggestions: serde_json::to_value(&self.suggestions)?,
            pre_fix_score,
        })
    }
}

/// The parts of an insight the generator works from.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightBrief {
    pub category: InsightCategory,
    pub priority: InsightPriority,
    pub title: String,
    pub description: String,
    pub platforms: Vec<String>,
}

impl InsightBrief {
    /// # Errors
    ///
    /// Returns [`PerceptionError::InvalidStoredValue`] if the stored category
    /// or priority is not recognised.
    pub fn from_row(row: &InsightRow) -> Result<Self, PerceptionError> {
        let category = row
            .category
            .parse()
            .map_err(|e: aeo_core::CoreError| PerceptionError::InvalidStoredValue(e.to_string()))?;
        let priority = row
            .priority
            .parse()
            .map_err(|e: aeo_core::CoreError| PerceptionError::InvalidStoredValue(e.to_string()))?;
        Ok(Self {
            category,
            priority,
            title: row.title.clone(),
            description: row.description.clone(),
            platforms: row.affected_platforms.clone(),
        })
    }

    fn is_urgent(&self) -> bool {
        matches!(
            self.priority,
            InsightPriority::Critical | InsightPriority::High
        )
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

pub struct CorrectionGenerator {
    client: OpenAiClient,
    model: String,
}

impl CorrectionGenerator {
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
        Ok(Self::new(OpenAiClient::from_app_config(config)?, CORRECTION_MODEL))
    }

    /// Generates every applicable fix for `insight`. Individual LLM failures
    /// are logged and that suggestion is skipped, so the plan may be empty.
    pub async fn generate(&self, insight: &InsightBrief, truth: &GroundTruth) -> CorrectionPlan {
        let problem = ProblemType::for_insight(insight.category);
        let context = truth.brand_context();
        let fill = |template: &str| {
            template
                .replace("{brandContext}", &context)
                .replace("{problemType}", problem.as_str())
                .replace("{issueDescription}", &insight.description)
        };

        let mut suggestions = Vec::new();

        let schema = self
            .ask(SCHEMA_ORG_SYSTEM, fill(SCHEMA_ORG_PROMPT), 0.3)
            .await
            .map(|content| extract_fenced(&content));
        if let Some(content) = keep(schema, FixType::SchemaOrg) {
            suggestions.push(suggestion(
                FixType::SchemaOrg,
                problem,
                "Schema.org Structured Data Update",
                format!(
                    "Update your website's JSON-LD structured data to address {}",
                    insight.title.to_lowercase()
                ),
                content,
                "High - Improves AI understanding of your brand",
            ));
        }

        let misconceptions = misconceptions(problem, truth);
        let faq = self
            .ask(
                FAQ_SYSTEM,
                fill(FAQ_PROMPT).replace("{misconceptions}", &misconceptions),
                0.5,
            )
            .await
            .map(|content| render_faq(&content));
        if let Some(content) = keep(faq, FixType::Faq) {
            suggestions.push(suggestion(
                FixType::Faq,
                problem,
                "FAQ Page Addition",
                "Add FAQ entries to address common misconceptions and missing information"
                    .to_string(),
                content,
                "Medium - Provides clear answers for AI to reference",
            ));
        }

        let recommendation = self
            .ask(CONTENT_SYSTEM, fill(CONTENT_PROMPT), 0.5)
            .await
            .map(|content| render_content(&content));
        if let Some(content) = keep(recommendation, FixType::Content) {
            suggestions.push(suggestion(
                FixType::Content,
                problem,
                "Content Update Recommendation",
                "Update website content to improve AI perception".to_string(),
                content,
                "High - Creates authoritative content for AI training",
            ));
        }

        if insight.is_urgent() {
            let wiki = self
                .ask(WIKIPEDIA_SYSTEM, fill(WIKIPEDIA_PROMPT), 0.3)
                .await
                .map(|content| render_wikipedia(&content));
            if let Some(content) = keep(wiki, FixType::Wikipedia) {
                suggestions.push(suggestion(
                    FixType::Wikipedia,
                    problem,
                    "Wikipedia Edit Suggestion",
                    "Suggested edits for your Wikipedia article (if applicable)".to_string(),
                    content,
                    "Very High - Wikipedia is a primary AI training source",
                ));
            }
        }

        tracing::info!(
            problem_type = %problem,
            suggestions = suggestions.len(),
            "correction plan generated"
        );

        CorrectionPlan {
            problem_type: problem,
            problem_description: insight.description.clone(),
            affected_platforms: insight.platforms.clone(),
            suggestions,
        }
    }

    async fn ask(
        &self,
        system: &str,
        prompt: String,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let request = ChatRequest::new(
            self.model.clone(),
            vec![ChatMessage::system(system), ChatMessage::user(prompt)],
        )
        .temperature(temperature)
        .max_tokens(MAX_TOKENS);
        Ok(self.client.chat(&request).await?.content)
    }
}

fn keep(result: Result<String, LlmError>, fix_type: FixType) -> Option<String> {
    match result {
        Ok(content) if !content.is_empty() => Some(content),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(%fix_type, error = %e, "correction generation failed");
            None
        }
    }
}

fn suggestion(
    fix_type: FixType,
    problem: ProblemType,
    title: &str,
    description: String,
    content: String,
    estimated_impact: &str,
) -> CorrectionSuggestion {
    CorrectionSuggestion {
        fix_type,
        title: title.to_string(),
        description,
        content,
        priority: problem.priority(),
        effort: fix_type.effort(),
        estimated_impact: estimated_impact.to_string(),
    }
}

/// The first FAQ questions for `problem`, phrased for this brand.
fn misconceptions(problem: ProblemType, truth: &GroundTruth) -> String {
    let competitor = truth
        .competitors
        .first()
        .map_or("its competitors", String::as_str);
    faq_questions(problem)
        .iter()
        .take(FAQ_SEED_QUESTIONS)
        .map(|q| {
            q.replace("{brandName}", &truth.brand_name)
                .replace("{competitorName}", competitor)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// The body of the first fenced block, or the whole reply when unfenced.
#[must_use]
pub fn extract_fenced(content: &str) -> String {
    let block = content.find("```").and_then(|start| {
        let body = start + 3;
        content[body..]
            .find("```")
            .map(|end| &content[start..body + end + 3])
    });
    strip_code_fences(block.unwrap_or(content)).to_string()
}

#[derive(Deserialize)]
struct FaqItem {
    question: String,
    answer: String,
}

/// `Q:`/`A:` pairs separated by blank lines; the raw reply if it holds no
/// usable JSON array.
#[must_use]
pub fn render_faq(content: &str) -> String {
    let parsed = JSON_ARRAY
        .find(content)
        .and_then(|m| serde_json::from_str::<Vec<FaqItem>>(m.as_str()).ok());
    match parsed {
        Some(items) => items
            .iter()
            .map(|item| format!("Q: {}\nA: {}", item.question, item.answer))
            .collect::<Vec<_>>()
            .join("\n\n"),
        None => content.trim().to_string(),
    }
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ContentRecommendation {
    section_title: String,
    headline: String,
    outline: Vec<String>,
    key_messages: Vec<String>,
    tone_guidance: String,
}

#[must_use]
pub fn render_content(content: &str) -> String {
    let Some(rec) = parse_object::<ContentRecommendation>(content) else {
        return content.trim().to_string();
    };
    let mut lines = vec![
        format!("## {}", rec.section_title),
        format!("### Headline: {}", rec.headline),
        String::new(),
        "### Content Outline:".to_string(),
    ];
    lines.extend(bullets(&rec.outline));
    lines.push(String::new());
    lines.push("### Key Messages:".to_string());
    lines.extend(bullets(&rec.key_messages));
    lines.push(String::new());
    lines.push(format!("### Tone Guidance: {}", rec.tone_guidance));
    lines.join("\n")
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WikipediaSuggestion {
    suggested_edits: Vec<String>,
    sources_needed: Vec<String>,
    existing_claims_to_update: Vec<String>,
    notes: String,
}

#[must_use]
pub fn render_wikipedia(content: &str) -> String {
    let Some(wiki) = parse_object::<WikipediaSuggestion>(content) else {
        return content.trim().to_string();
    };
    let mut lines = vec![
        "## Wikipedia Edit Suggestions".to_string(),
        String::new(),
        "### Suggested Edits:".to_string(),
    ];
    lines.extend(bullets(&wiki.suggested_edits));
    lines.push(String::new());
    lines.push("### Sources Needed:".to_string());
    lines.extend(bullets(&wiki.sources_needed));
    lines.push(String::new());
    lines.push("### Existing Claims to Update:".to_string());
    lines.extend(bullets(&wiki.existing_claims_to_update));
    lines.push(String::new());
    lines.push(format!("### Notes: {}", wiki.notes));
    lines.join("\n")
}

fn parse_object<T: for<'de> Deserialize<'de>>(content: &str) -> Option<T> {
    JSON_OBJECT
        .find(content)
        .and_then(|m| serde_json::from_str(m.as_str()).ok())
}

fn bullets(items: &[String]) -> impl Iterator<Item = String> + '_ {
    items.iter().map(|item| format!("- {item}"))
}

#[cfg(test)]
#[path = "corrections_test.rs"]
mod tests;
