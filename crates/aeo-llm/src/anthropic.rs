//! Client for the Anthropic messages API.

use std::time::Duration;

use aeo_core::AppConfig;
use reqwest::Client;

use crate::error::LlmError;
use crate::retry::retry_with_backoff;
use crate::types::{
    AnthropicBlock, AnthropicRequest, AnthropicResponse, ChatCompletion, ChatMessage,
};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const PROVIDER: &str = "Anthropic";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl AnthropicClient {
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            max_retries: 2,
            backoff_base_ms: 1_000,
        })
    }

    /// # Errors
    ///
    /// Returns [`LlmError::MissingApiKey`] when `ANTHROPIC_API_KEY` is unset.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, LlmError> {
        let api_key = config
            .anthropic_api_key
            .as_deref()
            .ok_or(LlmError::MissingApiKey("ANTHROPIC_API_KEY"))?;
        Ok(Self::with_base_url(
            api_key,
            config.llm_request_timeout_secs,
            &config.anthropic_base_url,
        )?
        .with_retry(config.llm_max_retries, config.llm_retry_backoff_ms))
    }

    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Sends a single-turn message and returns the concatenated text blocks.
    ///
    /// # Errors
    ///
    /// - [`LlmError::RateLimited`] on HTTP 429 after retries.
    /// - [`LlmError::Api`] on any other non-2xx status.
    /// - [`LlmError::EmptyResponse`] if no text block came back.
    pub async fn complete(
        &self,
        model: &str,
        system: Option<&str>,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<ChatCompletion, LlmError> {
        let endpoint = format!("{}/messages", self.base_url);
        let url = endpoint.as_str();
        let request = AnthropicRequest {
            model,
            max_tokens,
            system,
            messages: vec![ChatMessage::user(prompt)],
            temperature,
        };
        let body = &request;
        tracing::debug!(model, "Anthropic messages request");

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self
                .client
                .post(url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(body)
                .send()
                .await?;

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after_secs = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(60);
                return Err(LlmError::RateLimited {
                    provider: PROVIDER,
                    retry_after_secs,
                });
            }
            if !status.is_success() {
                return Err(LlmError::Api {
                    provider: PROVIDER,
                    status: status.as_u16(),
                    body: response.text().await.unwrap_or_default(),
                });
            }

            let text = response.text().await?;
            let parsed: AnthropicResponse =
                serde_json::from_str(&text).map_err(|e| LlmError::Deserialize {
                    context: format!("messages response ({model})"),
                    source: e,
                })?;

            let content = parsed
                .content
                .into_iter()
                .filter_map(|block| match block {
                    AnthropicBlock::Text { text } => Some(text),
                    AnthropicBlock::Other => None,
                })
                .collect::<Vec<_>>()
                .join("");
            if content.trim().is_empty() {
                return Err(LlmError::EmptyResponse { provider: PROVIDER });
            }

            Ok(ChatCompletion {
                content,
                model: parsed.model,
                usage: parsed.usage,
            })
        })
        .await
    }
}
