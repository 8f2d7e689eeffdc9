use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub brands_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,

    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub llm_request_timeout_secs: u64,
    pub llm_min_interval_ms: u64,
    pub llm_max_retries: u32,
    pub llm_retry_backoff_ms: u64,

    pub firecrawl_api_key: Option<String>,
    pub firecrawl_base_url: String,
    pub crawl_max_pages: u32,
    pub crawl_max_depth: u32,
    pub crawl_timeout_secs: u64,
    pub crawl_poll_interval_ms: u64,
    pub crawl_max_retries: u32,
    pub crawl_retry_backoff_ms: u64,

    pub scan_mock_platforms: bool,
    pub scan_max_concurrent_queries: usize,
    pub scan_schedule: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[redacted]");
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("brands_path", &self.brands_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("openai_api_key", &redact(&self.openai_api_key))
            .field("openai_base_url", &self.openai_base_url)
            .field("openai_model", &self.openai_model)
            .field("anthropic_api_key", &redact(&self.anthropic_api_key))
            .field("anthropic_base_url", &self.anthropic_base_url)
            .field("llm_request_timeout_secs", &self.llm_request_timeout_secs)
            .field("llm_min_interval_ms", &self.llm_min_interval_ms)
            .field("llm_max_retries", &self.llm_max_retries)
            .field("llm_retry_backoff_ms", &self.llm_retry_backoff_ms)
            .field("firecrawl_api_key", &redact(&self.firecrawl_api_key))
            .field("firecrawl_base_url", &self.firecrawl_base_url)
            .field("crawl_max_pages", &self.crawl_max_pages)
            .field("crawl_max_depth", &self.crawl_max_depth)
            .field("crawl_timeout_secs", &self.crawl_timeout_secs)
            .field("crawl_poll_interval_ms", &self.crawl_poll_interval_ms)
            .field("crawl_max_retries", &self.crawl_max_retries)
            .field("crawl_retry_backoff_ms", &self.crawl_retry_backoff_ms)
            .field("scan_mock_platforms", &self.scan_mock_platforms)
            .field(
                "scan_max_concurrent_queries",
                &self.scan_max_concurrent_queries,
            )
            .field("scan_schedule", &self.scan_schedule)
            .finish()
    }
}
