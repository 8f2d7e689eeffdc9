//! `analyze`: crawl a brand's site, extract a Brand 360 profile, and store it.

use aeo_crawler::{CrawlOptions, FirecrawlClient};
use aeo_profiler::{low_confidence_fields, save_profile, BrandExtractor, DEFAULT_REVIEW_THRESHOLD};

use crate::load_brand;

/// # Errors
///
/// Returns an error if the brand is unknown, the Firecrawl or OpenAI keys
/// are missing, the crawl or extraction fails, or the profile cannot be saved.
pub(crate) async fn run_analyze(
    pool: &sqlx::PgPool,
    config: &aeo_core::AppConfig,
    slug: &str,
    url: Option<&str>,
) -> anyhow::Result<()> {
    let brand = load_brand(pool, slug).await?;
    let url = url.map_or_else(|| format!("https://{}", brand.domain), ToOwned::to_owned);

    let crawler = FirecrawlClient::from_app_config(config)?;
    let extractor = BrandExtractor::from_app_config(config)?;
    let options = CrawlOptions::from_app_config(config);

    tracing::info!(brand = %brand.slug, url = %url, "crawling");
    let crawl = crawler.crawl_with_retry(&url, &options).await?;
    println!("crawled {} pages from {url}", crawl.page_count);

    let profile = extractor.extract_profile(&crawl).await?;
    let row = save_profile(pool, brand.id, &profile).await?;
    println!(
        "profile saved for '{}' (overall confidence {:.2})",
        brand.slug,
        row.overall_confidence.unwrap_or_default()
    );

    let review = low_confidence_fields(&profile, DEFAULT_REVIEW_THRESHOLD);
    if review.is_empty() {
        println!("no fields need review");
        return Ok(());
    }

    println!(
        "\n{} fields below {DEFAULT_REVIEW_THRESHOLD:.2} confidence:",
        review.len()
    );
    println!("{:<24}{:<28}CONFIDENCE", "SECTION", "FIELD");
    for item in &review {
        println!("{:<24}{:<28}{:.2}", item.section, item.field, item.confidence);
    }
    Ok(())
}
