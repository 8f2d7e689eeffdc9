//! Retry with exponential backoff for crawl requests.
//!
//! Timeouts are never retried, whether the crawl job or a single request
//! ran out of time.

use std::future::Future;
use std::time::Duration;

use crate::error::CrawlerError;

/// Network failures, 429 and 5xx responses are transient. Everything else,
/// including [`CrawlerError::Timeout`] and request timeouts, is returned
/// immediately.
fn is_retriable(err: &CrawlerError) -> bool {
    match err {
        CrawlerError::Http(e) => !e.is_timeout(),
        CrawlerError::RateLimited { .. } => true,
        CrawlerError::UnexpectedStatus { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Wait before retry `n` (1-based): `backoff_base_ms * 2^n`, so a 1 s base
/// waits 2 s, then 4 s.
fn backoff_delay_ms(backoff_base_ms: u64, retry: u32) -> u64 {
    backoff_base_ms.saturating_mul(1u64 << retry.min(62))
}

/// Runs `operation`, retrying transient failures up to `max_retries` extra
/// times with [`backoff_delay_ms`] between attempts.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, CrawlerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CrawlerError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retriable(&err) || attempt >= max_retries => return Err(err),
            Err(err) => err,
        };

        let delay_ms = backoff_delay_ms(backoff_base_ms, attempt + 1);
        tracing::warn!(
            attempt = attempt + 1,
            max_retries,
            delay_ms,
            error = %err,
            "crawl attempt failed, retrying"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempt += 1;
    }
}
