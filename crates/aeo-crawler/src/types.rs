use std::time::Duration;

use aeo_core::AppConfig;
use serde::{Deserialize, Serialize};

/// Per-crawl settings.
#[derive(Debug, Clone, Copy)]
pub struct CrawlOptions {
    pub max_pages: u32,
    pub max_depth: u32,
    /// Upper bound on the whole crawl, including polling.
    pub timeout: Duration,
    pub poll_interval: Duration,
    pub ignore_robots_txt: bool,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_pages: 50,
            max_depth: 3,
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(2),
            ignore_robots_txt: false,
        }
    }
}

impl CrawlOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_pages: config.crawl_max_pages,
            max_depth: config.crawl_max_depth,
            timeout: Duration::from_secs(config.crawl_timeout_secs),
            poll_interval: Duration::from_millis(config.crawl_poll_interval_ms),
            ignore_robots_txt: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CrawlRequest<'a> {
    pub url: &'a str,
    pub limit: u32,
    pub max_depth: u32,
    pub ignore_robots_txt: bool,
    pub scrape_options: ScrapeOptions,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScrapeOptions {
    pub formats: Vec<&'static str>,
}

/// Response to `POST /v1/crawl`. Self-hosted deployments may answer
/// synchronously with `data`; the hosted service returns a job `id`.
#[derive(Debug, Deserialize)]
pub(crate) struct CrawlStartResponse {
    #[serde(default)]
    pub success: bool,
    pub id: Option<String>,
    pub data: Option<Vec<FirecrawlPage>>,
    pub error: Option<String>,
}

/// Response to `GET /v1/crawl/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct CrawlStatusResponse {
    pub status: String,
    #[serde(default)]
    pub data: Vec<FirecrawlPage>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirecrawlPage {
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub metadata: PageMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(rename = "sourceURL")]
    pub source_url: Option<String>,
    pub og_image: Option<String>,
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Crawled site content ready for extraction.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    /// The normalized URL that was crawled.
    pub url: String,
    /// Markdown of every page joined by a horizontal-rule separator.
    pub content: String,
    /// Metadata of the first page.
    pub metadata: PageMetadata,
    pub urls: Vec<String>,
    pub page_count: usize,
}

pub(crate) const PAGE_SEPARATOR: &str = "\n\n---\n\n";

impl CrawlResult {
    pub(crate) fn from_pages(url: &str, pages: &[FirecrawlPage]) -> Self {
        let content = pages
            .iter()
            .filter_map(|p| p.markdown.as_deref())
            .filter(|m| !m.trim().is_empty())
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR);

        let urls = pages
            .iter()
            .filter_map(|p| p.metadata.source_url.clone())
            .collect();

        Self {
            url: url.to_owned(),
            content,
            metadata: pages.first().map(|p| p.metadata.clone()).unwrap_or_default(),
            urls,
            page_count: pages.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(markdown: &str, source: &str) -> FirecrawlPage {
        FirecrawlPage {
            markdown: Some(markdown.to_owned()),
            metadata: PageMetadata {
                title: Some(format!("title of {source}")),
                source_url: Some(source.to_owned()),
                ..PageMetadata::default()
            },
        }
    }

    #[test]
    fn from_pages_joins_markdown_and_collects_urls() {
        let pages = vec![
            page("# Home", "https://acme.io"),
            page("   ", "https://acme.io/empty"),
            page("# About", "https://acme.io/about"),
        ];
        let result = CrawlResult::from_pages("https://acme.io", &pages);
        assert_eq!(result.content, "# Home\n\n---\n\n# About");
        assert_eq!(result.page_count, 3);
        assert_eq!(result.urls.len(), 3);
        assert_eq!(
            result.metadata.title.as_deref(),
            Some("title of https://acme.io")
        );
    }

    #[test]
    fn metadata_reads_source_url_key() {
        let meta: PageMetadata = serde_json::from_str(
            r#"{"title":"Acme","sourceURL":"https://acme.io","ogImage":"https://acme.io/og.png"}"#,
        )
        .unwrap();
        assert_eq!(meta.source_url.as_deref(), Some("https://acme.io"));
        assert_eq!(meta.og_image.as_deref(), Some("https://acme.io/og.png"));
    }

    #[test]
    fn crawl_request_serializes_camel_case() {
        let req = CrawlRequest {
            url: "https://acme.io",
            limit: 10,
            max_depth: 2,
            ignore_robots_txt: false,
            scrape_options: ScrapeOptions {
                formats: vec!["markdown"],
            },
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["maxDepth"], 2);
        assert_eq!(v["ignoreRobotsTxt"], false);
        assert_eq!(v["scrapeOptions"]["formats"][0], "markdown");
    }
}
