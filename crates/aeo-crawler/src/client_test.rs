use super::*;

#[test]
fn with_base_url_strips_trailing_slash() {
    let client = FirecrawlClient::with_base_url("http://localhost:3002/", None, 5, 0, 0).unwrap();
    assert_eq!(client.base_url, "http://localhost:3002");
}

#[test]
fn new_targets_hosted_api() {
    let client = FirecrawlClient::new(Some("fc-test".to_owned()), 5, 2, 1000).unwrap();
    assert_eq!(client.base_url, "https://api.firecrawl.dev");
    assert_eq!(client.max_retries, 2);
    assert_eq!(client.backoff_base_ms, 1000);
}

#[test]
fn truncate_body_keeps_short_bodies() {
    assert_eq!(truncate_body("oops"), "oops");
}

#[test]
fn truncate_body_respects_char_boundaries() {
    let body = "é".repeat(400);
    let truncated = truncate_body(&body);
    assert!(truncated.ends_with('…'));
    assert!(truncated.len() <= 500 + '…'.len_utf8());
}

#[tokio::test]
async fn crawl_rejects_invalid_url_before_any_request() {
    let client = FirecrawlClient::with_base_url("http://127.0.0.1:9", None, 1, 0, 0).unwrap();
    let err = client
        .crawl("ftp://acme.io", &CrawlOptions::default())
        .await
        .unwrap_err();
    assert!(
        matches!(err, CrawlerError::InvalidUrl { .. }),
        "expected InvalidUrl, got: {err:?}"
    );
}
