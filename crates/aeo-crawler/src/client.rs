use std::time::Duration;

use aeo_core::AppConfig;
use reqwest::{Client, RequestBuilder, Response};
use tokio::time::Instant;

use crate::error::CrawlerError;
use crate::normalize::normalize_url;
use crate::retry::retry_with_backoff;
use crate::types::{
    CrawlOptions, CrawlRequest, CrawlResult, CrawlStartResponse, CrawlStatusResponse,
    FirecrawlPage, ScrapeOptions,
};

const USER_AGENT: &str = concat!("aeo-crawler/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the Firecrawl crawl API.
///
/// Handles both the synchronous response shape (pages returned inline) and
/// the job shape (an id that is polled until the crawl completes or fails).
/// Transient failures are retried by [`FirecrawlClient::crawl_with_retry`].
pub struct FirecrawlClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    /// Maximum number of retry attempts after the first failure.
    max_retries: u32,
    /// Base delay in milliseconds; retry `n` waits `backoff_base_ms * 2^n`.
    backoff_base_ms: u64,
}

impl FirecrawlClient {
    /// Creates a client against the hosted Firecrawl API.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        api_key: Option<String>,
        request_timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, CrawlerError> {
        Self::with_base_url(
            "https://api.firecrawl.dev",
            api_key,
            request_timeout_secs,
            max_retries,
            backoff_base_ms,
        )
    }

    /// Creates a client with a custom base URL (self-hosted Firecrawl, tests).
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Http`] if the `reqwest::Client` cannot be built.
    pub fn with_base_url(
        base_url: &str,
        api_key: Option<String>,
        request_timeout_secs: u64,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, CrawlerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            api_key,
            max_retries,
            backoff_base_ms,
        })
    }

    /// Builds a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Http`] if the `reqwest::Client` cannot be built.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, CrawlerError> {
        Self::with_base_url(
            &config.firecrawl_base_url,
            config.firecrawl_api_key.clone(),
            config.crawl_timeout_secs,
            config.crawl_max_retries,
            config.crawl_retry_backoff_ms,
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Crawls a site once, without retries.
    ///
    /// The URL is normalized first. If the service answers with a job id the
    /// job is polled every `options.poll_interval` until it completes, fails,
    /// or `options.timeout` elapses.
    ///
    /// # Errors
    ///
    /// - [`CrawlerError::InvalidUrl`] if the URL cannot be normalized.
    /// - [`CrawlerError::Unauthorized`] on HTTP 401/403.
    /// - [`CrawlerError::RateLimited`] on HTTP 429.
    /// - [`CrawlerError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`CrawlerError::CrawlFailed`] if the service reports the job failed.
    /// - [`CrawlerError::Timeout`] if the job is not done in time.
    /// - [`CrawlerError::EmptyCrawl`] if no pages came back.
    pub async fn crawl(
        &self,
        url: &str,
        options: &CrawlOptions,
    ) -> Result<CrawlResult, CrawlerError> {
        let url = normalize_url(url)?;
        let started = Instant::now();

        let body = CrawlRequest {
            url: &url,
            limit: options.max_pages,
            max_depth: options.max_depth,
            ignore_robots_txt: options.ignore_robots_txt,
            scrape_options: ScrapeOptions {
                formats: vec!["markdown"],
            },
        };
        let endpoint = format!("{}/v1/crawl", self.base_url);
        let response = self
            .authorized(self.client.post(&endpoint))
            .json(&body)
            .send()
            .await?;
        let start: CrawlStartResponse = Self::read_json(response, &endpoint).await?;

        let pages = match (start.data, start.id) {
            (Some(data), _) => data,
            (None, Some(id)) if start.success => {
                self.poll_until_done(&url, &id, options, started).await?
            }
            (None, _) => {
                return Err(CrawlerError::CrawlFailed {
                    crawl_id: String::new(),
                    reason: start
                        .error
                        .unwrap_or_else(|| "crawl was not accepted".to_owned()),
                });
            }
        };

        if pages.is_empty() {
            return Err(CrawlerError::EmptyCrawl { url });
        }

        let result = CrawlResult::from_pages(&url, &pages);
        tracing::info!(
            url = %result.url,
            pages = result.page_count,
            chars = result.content.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "crawl complete"
        );
        Ok(result)
    }

    /// Crawls a site, retrying transient failures with exponential backoff.
    /// Crawl timeouts are returned without retrying.
    ///
    /// # Errors
    ///
    /// Propagates the last error from [`Self::crawl`].
    pub async fn crawl_with_retry(
        &self,
        url: &str,
        options: &CrawlOptions,
    ) -> Result<CrawlResult, CrawlerError> {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.crawl(url, options)
        })
        .await
    }

    /// Returns `true` when the crawl service answers its health probe with 2xx.
    pub async fn health_check(&self) -> bool {
        let endpoint = format!("{}/e2e-test", self.base_url);
        match self.authorized(self.client.get(&endpoint)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "crawl service health check failed");
                false
            }
        }
    }

    async fn poll_until_done(
        &self,
        url: &str,
        crawl_id: &str,
        options: &CrawlOptions,
        started: Instant,
    ) -> Result<Vec<FirecrawlPage>, CrawlerError> {
        let endpoint = format!("{}/v1/crawl/{crawl_id}", self.base_url);

        loop {
            if started.elapsed() >= options.timeout {
                return Err(CrawlerError::Timeout {
                    url: url.to_owned(),
                    timeout_secs: options.timeout.as_secs(),
                });
            }

            let response = self.authorized(self.client.get(&endpoint)).send().await?;
            let status: CrawlStatusResponse = Self::read_json(response, &endpoint).await?;

            match status.status.as_str() {
                "completed" => return Ok(status.data),
                "failed" | "cancelled" => {
                    return Err(CrawlerError::CrawlFailed {
                        crawl_id: crawl_id.to_owned(),
                        reason: status.error.unwrap_or_else(|| status.status.clone()),
                    });
                }
                other => {
                    tracing::debug!(crawl_id, status = other, "crawl in progress");
                }
            }

            let remaining = options.timeout.saturating_sub(started.elapsed());
            tokio::time::sleep(options.poll_interval.min(remaining)).await;
        }
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: Response,
        endpoint: &str,
    ) -> Result<T, CrawlerError> {
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(60);
            return Err(CrawlerError::RateLimited { retry_after_secs });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(CrawlerError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CrawlerError::UnexpectedStatus {
                status: status.as_u16(),
                url: endpoint.to_owned(),
                body: truncate_body(&body),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<T>(&body).map_err(|e| CrawlerError::Deserialize {
            context: format!("crawl response from {endpoint}"),
            source: e,
        })
    }
}

/// Keeps error bodies readable in logs.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 500;
    if body.len() <= MAX {
        return body.to_owned();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
