use reqwest::Url;

use crate::error::CrawlerError;

/// Normalizes a user-supplied site URL before crawling.
///
/// Adds `https://` when no scheme is present and drops the query string and
/// fragment. Only `http` and `https` URLs with a host are accepted.
///
/// # Errors
///
/// Returns [`CrawlerError::InvalidUrl`] if the input cannot be parsed or is
/// not an http(s) URL with a host.
pub fn normalize_url(raw: &str) -> Result<String, CrawlerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CrawlerError::InvalidUrl {
            url: raw.to_owned(),
            reason: "empty URL".to_owned(),
        });
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| CrawlerError::InvalidUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(CrawlerError::InvalidUrl {
            url: raw.to_owned(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(CrawlerError::InvalidUrl {
            url: raw.to_owned(),
            reason: "missing host".to_owned(),
        });
    }

    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}
