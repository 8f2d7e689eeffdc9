//! Sends prompts to the AI platforms being monitored.
//!
//! `ChatGPT` and Claude are queried live when their API keys are configured.
//! Every other platform, and every platform in mock mode, gets a
//! deterministic placeholder answer so scans can run end to end.

use std::time::Instant;

use aeo_core::{AppConfig, Platform};
use aeo_llm::{AnthropicClient, ChatMessage, ChatRequest, OpenAiClient};
use serde::Serialize;

use crate::error::PerceptionError;

const CHATGPT_MODEL: &str = "gpt-4o";
const CHATGPT_TEMPERATURE: f32 = 0.7;
const CLAUDE_MODEL: &str = "claude-3-5-sonnet-latest";
const CLAUDE_TEMPERATURE: f32 = 0.7;
const MAX_RESPONSE_TOKENS: u32 = 1_500;
const MOCK_EXCERPT_CHARS: usize = 50;

/// A platform's answer to one prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub response: String,
    pub model: String,
    pub response_time_ms: i32,
}

pub struct PlatformQuerier {
    openai: Option<OpenAiClient>,
    anthropic: Option<AnthropicClient>,
    mock_all: bool,
}

impl PlatformQuerier {
    #[must_use]
    pub fn new(
        openai: Option<OpenAiClient>,
        anthropic: Option<AnthropicClient>,
        mock_all: bool,
    ) -> Self {
        Self {
            openai,
            anthropic,
            mock_all,
        }
    }

    /// Uses whichever provider keys are configured; the rest are mocked.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        let openai = OpenAiClient::from_app_config(config)
            .inspect_err(|e| tracing::debug!(error = %e, "ChatGPT platform will be mocked"))
            .ok();
        let anthropic = AnthropicClient::from_app_config(config)
            .inspect_err(|e| tracing::debug!(error = %e, "Claude platform will be mocked"))
            .ok();
        Self::new(openai, anthropic, config.scan_mock_platforms)
    }

    /// Whether `platform` is answered by a real provider.
    #[must_use]
    pub fn is_live(&self, platform: Platform) -> bool {
        if self.mock_all {
            return false;
        }
        match platform {
            Platform::ChatGpt => self.openai.is_some(),
            Platform::Claude => self.anthropic.is_some(),
            Platform::Gemini | Platform::Perplexity | Platform::GoogleAio => false,
        }
    }

    /// # Errors
    ///
    /// Returns [`PerceptionError::Llm`] if a live provider call fails.
    pub async fn query(
        &self,
        prompt: &str,
        platform: Platform,
    ) -> Result<QueryResult, PerceptionError> {
        let started = Instant::now();

        let live = !self.mock_all;
        let (response, model) = match (platform, &self.openai, &self.anthropic) {
            (Platform::ChatGpt, Some(client), _) if live => {
                let request = ChatRequest::new(CHATGPT_MODEL, vec![ChatMessage::user(prompt)])
                    .temperature(CHATGPT_TEMPERATURE)
                    .max_tokens(MAX_RESPONSE_TOKENS);
                let completion = client.chat(&request).await?;
                (completion.content, non_empty_or(completion.model, CHATGPT_MODEL))
            }
            (Platform::Claude, _, Some(client)) if live => {
                let completion = client
                    .complete(CLAUDE_MODEL, None, prompt, MAX_RESPONSE_TOKENS, CLAUDE_TEMPERATURE)
                    .await?;
                (completion.content, non_empty_or(completion.model, CLAUDE_MODEL))
            }
            _ => (mock_response(prompt, platform), format!("{platform}-mock")),
        };

        let response_time_ms = i32::try_from(started.elapsed().as_millis()).unwrap_or(i32::MAX);
        tracing::debug!(%platform, model, response_time_ms, "platform answered");

        Ok(QueryResult {
            response,
            model,
            response_time_ms,
        })
    }
}

fn non_empty_or(model: String, fallback: &str) -> String {
    if model.trim().is_empty() {
        fallback.to_string()
    } else {
        model
    }
}

/// Placeholder answer quoting the first 50 characters of the prompt.
#[must_use]
pub fn mock_response(prompt: &str, platform: Platform) -> String {
    let excerpt: String = prompt.chars().take(MOCK_EXCERPT_CHARS).collect();
    match platform {
        Platform::Claude => format!(
            "[Mock Claude Response] Based on my analysis of your query \"{excerpt}...\", I would \
             provide a thoughtful and balanced response. This is a placeholder for actual Claude \
             API integration."
        ),
        Platform::ChatGpt => format!(
            "[Mock ChatGPT Response] Regarding \"{excerpt}...\", this is a simulated response for \
             testing purposes."
        ),
        Platform::Gemini => format!(
            "[Mock Gemini Response] Let me help you with \"{excerpt}...\". This represents how \
             Google's Gemini might respond."
        ),
        Platform::Perplexity => format!(
            "[Mock Perplexity Response] According to my search about \"{excerpt}...\", here are \
             the key findings. This is a placeholder response."
        ),
        Platform::GoogleAio => format!(
            "[Mock Google AI Overview] For the query \"{excerpt}...\", Google's AI Overview would \
             display summarized information from search results."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_quotes_first_fifty_chars() {
        let prompt = "x".repeat(80);
        let text = mock_response(&prompt, Platform::Gemini);
        assert!(text.starts_with("[Mock Gemini Response]"));
        assert!(text.contains(&format!("\"{}...\"", "x".repeat(50))));
        assert!(!text.contains(&"x".repeat(51)));
    }

    #[test]
    fn mock_excerpt_respects_char_boundaries() {
        let text = mock_response("héllo wörld", Platform::Perplexity);
        assert!(text.contains("\"héllo wörld...\""));
    }

    #[test]
    fn nothing_is_live_without_clients() {
        let querier = PlatformQuerier::new(None, None, false);
        for platform in Platform::ALL {
            assert!(!querier.is_live(*platform));
        }
    }

    #[test]
    fn mock_mode_overrides_configured_clients() {
        let client = OpenAiClient::new("sk-test", 5).unwrap();
        let live = PlatformQuerier::new(Some(client.clone()), None, false);
        assert!(live.is_live(Platform::ChatGpt));
        assert!(!live.is_live(Platform::Gemini));

        let mocked = PlatformQuerier::new(Some(client), None, true);
        assert!(!mocked.is_live(Platform::ChatGpt));
    }

    #[tokio::test]
    async fn mocked_platform_reports_mock_model() {
        let querier = PlatformQuerier::new(None, None, false);
        let result = querier
            .query("Who is Acme?", Platform::Claude)
            .await
            .unwrap();
        assert_eq!(result.model, "claude-mock");
        assert!(result.response.contains("Who is Acme?"));
        assert!(result.response_time_ms >= 0);
    }
}
