//! Extraction prompts.
//!
//! Each task is a user-message template with `{name}` placeholders. Variables
//! that are missing or blank render as `N/A` so the model never sees a raw
//! placeholder.

use aeo_llm::truncate_to_char_boundary;

/// Site content beyond this many bytes is dropped before prompting.
pub const MAX_CONTENT_BYTES: usize = 60_000;

pub const SYSTEM_PROMPT: &str = "\
You are a senior brand strategist. You turn raw website content into a structured brand profile \
that AI assistants can rely on when describing, comparing and recommending the brand.

Principles:
- Infer what the site implies, not only what it states, and use industry context to fill gaps.
- Score every extraction from 0.0 to 1.0 by strength of evidence: 0.9+ explicit, 0.7-0.89 strongly \
implied, 0.5-0.69 reasonably inferred, 0.3-0.49 educated guess, below 0.3 speculation.
- Prefer specific statements over generic marketing filler.
- If information is unavailable use null or an empty array. Never invent facts.

Always answer with a single valid JSON object matching the requested schema, with no markdown.";

const IDENTITY_SCHEMA: &str = r#"{
  "brandName": "official brand name",
  "subBrands": ["sub-brand names"],
  "tagline": "primary tagline or null",
  "mission": { "statement": "what the brand does, for whom, and why", "confidence": 0.0, "isExplicit": false },
  "vision": { "statement": "future state the brand wants to create", "confidence": 0.0, "isExplicit": false },
  "coreValues": [{ "value": "name", "description": "short explanation" }],
  "uniqueValueProposition": "what makes the brand different",
  "brandPromise": "commitment to customers",
  "industry": "primary industry",
  "category": "specific category",
  "subCategory": "sub-category or null",
  "foundingYear": "year or null",
  "foundingStory": "origin story or null",
  "positioningStatement": "For [target], [Brand] is the [category] that [benefit] because [reason]",
  "sectionConfidence": 0.0
}"#;

const PORTFOLIO_SCHEMA: &str = r#"{
  "portfolioType": "products|services|hybrid",
  "categories": [{ "name": "category", "description": "what it includes", "productCount": null }],
  "heroOfferings": [{ "name": "flagship offering", "description": "customer-facing description", "keyBenefits": ["benefit"] }],
  "pricePositioning": "luxury|premium|mid-market|value",
  "qualitySignals": ["certifications, awards, trust signals"],
  "purchaseChannels": ["where customers buy"],
  "sectionConfidence": 0.0
}"#;

const LANDSCAPE_SCHEMA: &str = r#"{
  "marketPosition": "leader|challenger|follower|niche",
  "competitors": [{
    "name": "competitor",
    "type": "direct|indirect|aspirational",
    "overlapArea": "where they compete",
    "ourAdvantage": "the brand's advantage",
    "theirAdvantage": "the competitor's advantage",
    "confidence": 0.0
  }],
  "competitiveAdvantages": ["differentiator"],
  "marketOpportunities": ["growth opportunity"],
  "sectionConfidence": 0.0
}"#;

const VOICE_SCHEMA: &str = r#"{
  "primaryArchetype": "dominant archetype such as Sage, Hero, Creator",
  "secondaryArchetype": "archetype or null",
  "personalityTraits": ["trait"],
  "voiceAttributes": { "formality": "formal|balanced|casual", "tone": "serious|balanced|playful", "complexity": "technical|balanced|accessible", "energy": "reserved|balanced|enthusiastic" },
  "primaryTone": "one or two words",
  "secondaryTones": ["tone"],
  "signaturePhrases": ["phrase the brand uses"],
  "languageToAvoid": ["word or phrase to avoid"],
  "sectionConfidence": 0.0
}"#;

const AUDIENCE_SCHEMA: &str = r#"{
  "primarySegment": {
    "name": "segment", "description": "who they are",
    "demographics": { "ageRange": "", "gender": "", "income": "", "location": "", "occupation": "" },
    "psychographics": { "values": [], "lifestyle": "", "interests": [] },
    "painPoints": ["challenge"], "motivations": ["driver"], "decisionFactors": ["factor"]
  },
  "secondarySegments": [{ "name": "segment", "description": "who they are" }],
  "sectionConfidence": 0.0
}"#;

const GUIDANCE_SCHEMA: &str = r#"{
  "brandSummary": "two or three sentence summary for AI assistants",
  "whenToRecommend": ["scenario"],
  "keySellingPoints": ["selling point"],
  "accurateDescriptors": ["word that fits the brand"],
  "inaccurateDescriptors": ["word to avoid"],
  "sampleRecommendation": "how an assistant should recommend the brand"
}"#;

const METADATA_SCHEMA: &str = r#"{
  "overallConfidence": 0.0,
  "strongestSections": ["section"],
  "weakestSections": ["section"],
  "criticalGaps": ["missing information"],
  "recommendedActions": ["next step"],
  "dataQuality": "high|medium|low"
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionTask {
    ComprehensiveProfile,
    BrandIdentity,
    Competitors,
    Products,
}

impl ExtractionTask {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ComprehensiveProfile => "extract-comprehensive-profile",
            Self::BrandIdentity => "extract-brand-identity",
            Self::Competitors => "identify-competitors",
            Self::Products => "categorize-products",
        }
    }

    /// Placeholders the template expects.
    #[must_use]
    pub fn variables(self) -> &'static [&'static str] {
        match self {
            Self::ComprehensiveProfile => &["content", "product_data", "competitor_data"],
            Self::BrandIdentity | Self::Products => &["content"],
            Self::Competitors => &[
                "content",
                "industry",
                "category",
                "product_summary",
                "uvp",
                "target_audience",
            ],
        }
    }

    #[must_use]
    pub fn template(self) -> String {
        match self {
            Self::ComprehensiveProfile => format!(
                "TASK: Build a complete brand profile from the website content below.\n\n\
                 WEBSITE CONTENT:\n---\n{{content}}\n---\n\n\
                 ADDITIONAL DATA:\n- Product catalog: {{product_data}}\n- Competitors: {{competitor_data}}\n\n\
                 Respond with one JSON object with these keys:\n\
                 \"brandIdentity\": {IDENTITY_SCHEMA},\n\
                 \"brandVoice\": {VOICE_SCHEMA},\n\
                 \"targetAudience\": {AUDIENCE_SCHEMA},\n\
                 \"productPortfolio\": {PORTFOLIO_SCHEMA},\n\
                 \"competitiveLandscape\": {LANDSCAPE_SCHEMA},\n\
                 \"aiGuidance\": {GUIDANCE_SCHEMA},\n\
                 \"profileMetadata\": {METADATA_SCHEMA}\n\n\
                 Fill every field. Infer values that are not stated and lower the confidence accordingly."
            ),
            Self::BrandIdentity => format!(
                "TASK: Extract the core brand identity from the website content below.\n\n\
                 WEBSITE CONTENT:\n---\n{{content}}\n---\n\n\
                 Respond with a JSON object matching:\n{IDENTITY_SCHEMA}\n\n\
                 Set isExplicit only for statements quoted from the site. List 3-7 core values."
            ),
            Self::Competitors => format!(
                "TASK: Identify the brand's competitors from the website content and context below.\n\n\
                 WEBSITE CONTENT:\n---\n{{content}}\n---\n\n\
                 BRAND CONTEXT:\n- Industry: {{industry}}\n- Category: {{category}}\n\
                 - Products/Services: {{product_summary}}\n- Value proposition: {{uvp}}\n\
                 - Target audience: {{target_audience}}\n\n\
                 Respond with a JSON object matching:\n{LANDSCAPE_SCHEMA}\n\n\
                 Include 3-5 competitors: direct for the same products and market, indirect for the \
                 same need, aspirational for market leaders."
            ),
            Self::Products => format!(
                "TASK: Categorize the brand's products and services from the website content below.\n\n\
                 WEBSITE CONTENT:\n---\n{{content}}\n---\n\n\
                 Respond with a JSON object matching:\n{PORTFOLIO_SCHEMA}\n\n\
                 Include 2-5 hero offerings that the site features prominently."
            ),
        }
    }

    /// Renders the template. Values are looked up by placeholder name; absent
    /// or blank values become `N/A`. The `content` value is truncated to
    /// [`MAX_CONTENT_BYTES`].
    #[must_use]
    pub fn render(self, vars: &[(&str, &str)]) -> String {
        let mut rendered = self.template();
        for name in self.variables() {
            let value = vars
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.trim())
                .filter(|v| !v.is_empty())
                .unwrap_or("N/A");
            let value = if *name == "content" {
                truncate_to_char_boundary(value, MAX_CONTENT_BYTES)
            } else {
                value
            };
            rendered = rendered.replace(&format!("{{{name}}}"), value);
        }
        rendered
    }
}
