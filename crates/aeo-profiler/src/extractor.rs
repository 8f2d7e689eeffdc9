//! LLM-backed brand extraction.

use std::time::Duration;

use aeo_core::AppConfig;
use aeo_crawler::CrawlResult;
use aeo_llm::{estimate_tokens, ChatMessage, ChatRequest, OpenAiClient, Throttle};
use chrono::Utc;
use serde::de::DeserializeOwned;

use crate::error::ProfilerError;
use crate::profile::{
    Brand360Profile, BrandIdentity, CompetitiveLandscape, Competitor, ProductPortfolio,
    PROFILE_VERSION,
};
use crate::tasks::{ExtractionTask, SYSTEM_PROMPT};

const EXTRACTION_TEMPERATURE: f32 = 0.3;
const EXTRACTION_MAX_TOKENS: u32 = 16_000;

/// Context passed to competitor identification.
#[derive(Debug, Clone, Default)]
pub struct CompetitorContext {
    pub industry: String,
    pub category: String,
    pub product_summary: String,
    pub uvp: String,
    pub target_audience: String,
}

impl CompetitorContext {
    /// Builds the context from a previously extracted profile.
    #[must_use]
    pub fn from_profile(profile: &Brand360Profile) -> Self {
        let products = profile
            .product_portfolio
            .hero_offerings
            .iter()
            .map(|h| h.name.as_str())
            .chain(profile.product_portfolio.categories.iter().map(|c| c.name.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            industry: profile.brand_identity.industry.clone(),
            category: profile.brand_identity.category.clone(),
            product_summary: products,
            uvp: profile.brand_identity.unique_value_proposition.clone(),
            target_audience: profile.target_audience.primary_segment.name.clone(),
        }
    }
}

/// Runs the extraction prompts against an `OpenAI`-compatible model.
///
/// Calls are spaced by a shared [`Throttle`] so a burst of analyses does not
/// trip provider rate limits.
pub struct BrandExtractor {
    client: OpenAiClient,
    model: String,
    throttle: Throttle,
}

impl BrandExtractor {
    #[must_use]
    pub fn new(client: OpenAiClient, model: impl Into<String>, min_interval: Duration) -> Self {
        Self {
            client,
            model: model.into(),
            throttle: Throttle::new(min_interval),
        }
    }

    /// # Errors
    ///
    /// Returns [`ProfilerError::Llm`] if `OPENAI_API_KEY` is not configured.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ProfilerError> {
        let client = OpenAiClient::from_app_config(config)?;
        Ok(Self::new(
            client,
            config.openai_model.clone(),
            Duration::from_millis(config.llm_min_interval_ms),
        ))
    }

    async fn run<T: DeserializeOwned>(
        &self,
        task: ExtractionTask,
        vars: &[(&str, &str)],
    ) -> Result<T, ProfilerError> {
        self.throttle.wait().await;

        let user_prompt = task.render(vars);
        tracing::info!(
            task = task.as_str(),
            model = %self.model,
            estimated_tokens = estimate_tokens(SYSTEM_PROMPT) + estimate_tokens(&user_prompt),
            "running extraction task"
        );

        let request = ChatRequest::new(
            self.model.clone(),
            vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user_prompt)],
        )
        .temperature(EXTRACTION_TEMPERATURE)
        .max_tokens(EXTRACTION_MAX_TOKENS);

        Ok(self.client.chat_json(request, task.as_str()).await?)
    }

    /// Extracts the full Brand 360 profile from crawled site content.
    ///
    /// # Errors
    ///
    /// - [`ProfilerError::EmptyContent`] if the crawl has no markdown.
    /// - [`ProfilerError::Llm`] if the model call or JSON decoding fails.
    pub async fn extract_profile(
        &self,
        crawl: &CrawlResult,
    ) -> Result<Brand360Profile, ProfilerError> {
        ensure_content(crawl)?;
        let mut profile: Brand360Profile = self
            .run(
                ExtractionTask::ComprehensiveProfile,
                &[
                    ("content", crawl.content.as_str()),
                    ("product_data", "None available"),
                    ("competitor_data", "None available"),
                ],
            )
            .await?;

        profile.profile_version = PROFILE_VERSION.to_owned();
        profile.generated_at = Utc::now().to_rfc3339();
        profile.source_url.clone_from(&crawl.url);
        profile.clamp_confidences();

        tracing::info!(
            url = %crawl.url,
            brand = %profile.brand_identity.brand_name,
            overall_confidence = profile.profile_metadata.overall_confidence,
            competitors = profile.competitive_landscape.competitors.len(),
            "profile extracted"
        );
        Ok(profile)
    }

    /// Extracts only the identity section.
    ///
    /// # Errors
    ///
    /// Same as [`Self::extract_profile`].
    pub async fn extract_identity(
        &self,
        crawl: &CrawlResult,
    ) -> Result<BrandIdentity, ProfilerError> {
        ensure_content(crawl)?;
        let mut identity: BrandIdentity = self
            .run(ExtractionTask::BrandIdentity, &[("content", crawl.content.as_str())])
            .await?;
        identity.mission.confidence = identity.mission.confidence.clamp(0.0, 1.0);
        identity.vision.confidence = identity.vision.confidence.clamp(0.0, 1.0);
        identity.section_confidence = identity.section_confidence.clamp(0.0, 1.0);
        Ok(identity)
    }

    /// Identifies competitors, returning them with clamped confidence and
    /// without blank names.
    ///
    /// # Errors
    ///
    /// Same as [`Self::extract_profile`].
    pub async fn identify_competitors(
        &self,
        crawl: &CrawlResult,
        context: &CompetitorContext,
    ) -> Result<Vec<Competitor>, ProfilerError> {
        ensure_content(crawl)?;
        let landscape: CompetitiveLandscape = self
            .run(
                ExtractionTask::Competitors,
                &[
                    ("content", crawl.content.as_str()),
                    ("industry", context.industry.as_str()),
                    ("category", context.category.as_str()),
                    ("product_summary", context.product_summary.as_str()),
                    ("uvp", context.uvp.as_str()),
                    ("target_audience", context.target_audience.as_str()),
                ],
            )
            .await?;

        Ok(landscape
            .competitors
            .into_iter()
            .filter(|c| !c.name.trim().is_empty())
            .map(|mut c| {
                c.confidence = c.confidence.clamp(0.0, 1.0);
                c
            })
            .collect())
    }

    /// Categorizes products and services.
    ///
    /// # Errors
    ///
    /// Same as [`Self::extract_profile`].
    pub async fn categorize_products(
        &self,
        crawl: &CrawlResult,
    ) -> Result<ProductPortfolio, ProfilerError> {
        ensure_content(crawl)?;
        let mut portfolio: ProductPortfolio = self
            .run(ExtractionTask::Products, &[("content", crawl.content.as_str())])
            .await?;
        portfolio.section_confidence = portfolio.section_confidence.clamp(0.0, 1.0);
        Ok(portfolio)
    }
}

fn ensure_content(crawl: &CrawlResult) -> Result<(), ProfilerError> {
    if crawl.content.trim().is_empty() {
        return Err(ProfilerError::EmptyContent(crawl.url.clone()));
    }
    Ok(())
}
