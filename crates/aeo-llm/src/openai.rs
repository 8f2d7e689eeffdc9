//! Client for the `OpenAI` chat completions API.

use std::time::Duration;

use aeo_core::AppConfig;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use crate::error::LlmError;
use crate::json::parse_json_lenient;
use crate::retry::retry_with_backoff;
use crate::text::estimate_tokens;
use crate::types::{ChatCompletion, ChatRequest, OpenAiResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const PROVIDER: &str = "OpenAI";

/// `OpenAI` chat completions client with retry on transient failures.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl OpenAiClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (proxies, wiremock).
    ///
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

    /// Builds a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::MissingApiKey`] when `OPENAI_API_KEY` is unset, or
    /// [`LlmError::Http`] if the `reqwest::Client` cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, LlmError> {
        let api_key = config
            .openai_api_key
            .as_deref()
            .ok_or(LlmError::MissingApiKey("OPENAI_API_KEY"))?;
        Ok(
            Self::with_base_url(api_key, config.llm_request_timeout_secs, &config.openai_base_url)?
                .with_retry(config.llm_max_retries, config.llm_retry_backoff_ms),
        )
    }

    /// Overrides the retry policy. `max_retries = 0` disables retries.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Sends a chat completion request and returns the first choice's text.
    ///
    /// # Errors
    ///
    /// - [`LlmError::RateLimited`] on HTTP 429 after retries.
    /// - [`LlmError::Api`] on any other non-2xx status.
    /// - [`LlmError::EmptyResponse`] if the first choice carries no text.
    /// - [`LlmError::Http`] / [`LlmError::Deserialize`] on transport or
    ///   decoding failures.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatCompletion, LlmError> {
        let endpoint = format!("{}/chat/completions", self.base_url);
        let url = endpoint.as_str();
        let prompt_tokens: usize = request
            .messages
            .iter()
            .map(|m| estimate_tokens(&m.content))
            .sum();
        tracing::debug!(model = %request.model, prompt_tokens, "OpenAI chat request");

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || async move {
            let response = self
                .client
                .post(url)
                .bearer_auth(&self.api_key)
                .json(request)
                .send()
                .await?;
            let body = check_status(response).await?;
            let parsed: OpenAiResponse =
                serde_json::from_str(&body).map_err(|e| LlmError::Deserialize {
                    context: format!("chat completion ({})", request.model),
                    source: e,
                })?;

            let content = parsed
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .filter(|c| !c.trim().is_empty())
                .ok_or(LlmError::EmptyResponse { provider: PROVIDER })?;

            Ok(ChatCompletion {
                content,
                model: parsed.model,
                usage: parsed.usage,
            })
        })
        .await
    }

    /// Sends the request in JSON mode and decodes the reply leniently into `T`.
    ///
    /// # Errors
    ///
    /// Any error from [`Self::chat`], or [`LlmError::Deserialize`] if the
    /// reply cannot be decoded even after repair.
    pub async fn chat_json<T: DeserializeOwned>(
        &self,
        request: ChatRequest,
        context: &str,
    ) -> Result<T, LlmError> {
        let completion = self.chat(&request.json_mode()).await?;
        parse_json_lenient(&completion.content, context)
    }
}

/// Maps non-2xx responses to typed errors; returns the body text otherwise.
async fn check_status(response: Response) -> Result<String, LlmError> {
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
        let body = response.text().await.unwrap_or_default();
        return Err(LlmError::Api {
            provider: PROVIDER,
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.text().await?)
}
