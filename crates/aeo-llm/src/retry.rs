//! Retry with exponential back-off and jitter for chat completion calls.

use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

const MAX_DELAY_MS: u64 = 60_000;

/// Timeouts, connection failures, 5xx and 429 are worth another attempt.
/// Authentication, 4xx and malformed bodies are not.
pub(crate) fn is_retriable(err: &LlmError) -> bool {
    match err {
        LlmError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        LlmError::Api { status, .. } => *status >= 500,
        LlmError::RateLimited { .. } => true,
        LlmError::EmptyResponse { .. }
        | LlmError::Deserialize { .. }
        | LlmError::MissingApiKey(_) => false,
    }
}

/// Delay before retry `attempt` (1-based): `base * 2^(attempt-1)` capped at
/// 60 s, then scaled by a random factor in `[0.75, 1.25)`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn backoff_delay_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = backoff_delay_ms(backoff_base_ms, attempt);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "LLM transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn server_error() -> LlmError {
        LlmError::Api {
            provider: "OpenAI",
            status: 503,
            body: "overloaded".to_owned(),
        }
    }

    #[test]
    fn backoff_stays_within_jitter_band() {
        for attempt in 1..=3 {
            let base = 1_000u64 << (attempt - 1);
            let delay = backoff_delay_ms(1_000, attempt);
            assert!(delay >= base * 3 / 4, "attempt {attempt}: {delay}");
            assert!(delay <= base * 5 / 4, "attempt {attempt}: {delay}");
        }
    }

    #[test]
    fn backoff_is_capped() {
        let delay = backoff_delay_ms(1_000, 20);
        assert!(delay <= MAX_DELAY_MS * 5 / 4);
    }

    #[test]
    fn client_errors_are_not_retriable() {
        let err = LlmError::Api {
            provider: "OpenAI",
            status: 400,
            body: String::new(),
        };
        assert!(!is_retriable(&err));
        assert!(!is_retriable(&LlmError::MissingApiKey("OPENAI_API_KEY")));
        assert!(is_retriable(&LlmError::RateLimited {
            provider: "Anthropic",
            retry_after_secs: 1
        }));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(server_error())
                } else {
                    Ok::<_, LlmError>(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = retry_with_backoff(1, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(server_error())
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
