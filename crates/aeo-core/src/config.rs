use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from the variables already in the process
/// environment, without reading `.env`.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    // Empty strings count as unset so `.env` templates with blank keys work.
    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().filter(|v| !v.trim().is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("AEO_ENV", "development"))?;

    let bind_addr = parse_addr("AEO_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("AEO_LOG_LEVEL", "info");
    let brands_path = PathBuf::from(or_default("AEO_BRANDS_PATH", "./config/brands.yaml"));

    let db_max_connections = parse_u32("AEO_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("AEO_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("AEO_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "AEO_DB_MIN_CONNECTIONS",
            format!(
                "min connections ({db_min_connections}) exceeds max connections ({db_max_connections})"
            ),
        ));
    }

    let openai_api_key = optional("OPENAI_API_KEY");
    let openai_base_url = or_default("OPENAI_BASE_URL", "https://api.openai.com/v1");
    let openai_model = or_default("OPENAI_MODEL", "gpt-4o-mini");
    let anthropic_api_key = optional("ANTHROPIC_API_KEY");
    let anthropic_base_url = or_default("ANTHROPIC_BASE_URL", "https://api.anthropic.com/v1");
    let llm_request_timeout_secs = parse_u64("AEO_LLM_REQUEST_TIMEOUT_SECS", "60")?;
    let llm_min_interval_ms = parse_u64("AEO_LLM_MIN_INTERVAL_MS", "1000")?;
    let llm_max_retries = parse_u32("AEO_LLM_MAX_RETRIES", "2")?;
    let llm_retry_backoff_ms = parse_u64("AEO_LLM_RETRY_BACKOFF_MS", "1000")?;

    let firecrawl_api_key = optional("FIRECRAWL_API_KEY");
    let firecrawl_base_url = or_default("FIRECRAWL_BASE_URL", "https://api.firecrawl.dev");
    let crawl_max_pages = parse_u32("AEO_CRAWL_MAX_PAGES", "50")?;
    let crawl_max_depth = parse_u32("AEO_CRAWL_MAX_DEPTH", "3")?;
    let crawl_timeout_secs = parse_u64("AEO_CRAWL_TIMEOUT_SECS", "30")?;
    let crawl_poll_interval_ms = parse_u64("AEO_CRAWL_POLL_INTERVAL_MS", "2000")?;
    let crawl_max_retries = parse_u32("AEO_CRAWL_MAX_RETRIES", "2")?;
    let crawl_retry_backoff_ms = parse_u64("AEO_CRAWL_RETRY_BACKOFF_MS", "1000")?;

    let scan_mock_platforms = parse_bool("AEO_SCAN_MOCK_PLATFORMS", "false")?;
    let scan_max_concurrent_queries = parse_usize("AEO_SCAN_MAX_CONCURRENT_QUERIES", "4")?;
    if scan_max_concurrent_queries == 0 {
        return Err(invalid(
            "AEO_SCAN_MAX_CONCURRENT_QUERIES",
            "must be at least 1".to_string(),
        ));
    }
    let scan_schedule = or_default("AEO_SCAN_SCHEDULE", "0 0 6 * * MON");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        brands_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        openai_api_key,
        openai_base_url,
        openai_model,
        anthropic_api_key,
        anthropic_base_url,
        llm_request_timeout_secs,
        llm_min_interval_ms,
        llm_max_retries,
        llm_retry_backoff_ms,
        firecrawl_api_key,
        firecrawl_base_url,
        crawl_max_pages,
        crawl_max_depth,
        crawl_timeout_secs,
        crawl_poll_interval_ms,
        crawl_max_retries,
        crawl_retry_backoff_ms,
        scan_mock_platforms,
        scan_max_concurrent_queries,
        scan_schedule,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "AEO_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
