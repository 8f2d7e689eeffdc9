use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by crawl service (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("crawl service rejected the API key")]
    Unauthorized,

    #[error("unexpected HTTP status {status} from {url}: {body}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        body: String,
    },

    #[error("crawl {crawl_id} failed: {reason}")]
    CrawlFailed { crawl_id: String, reason: String },

    #[error("crawl of {url} did not finish within {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    #[error("crawl of {url} returned no pages")]
    EmptyCrawl { url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}
