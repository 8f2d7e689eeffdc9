//! Long-lived clients shared by request handlers and the scheduler.
//!
//! Each service is optional: a server without `OPENAI_API_KEY` still serves
//! stored data and answers the LLM-backed routes with 503.

use aeo_core::AppConfig;
use aeo_crawler::{CrawlOptions, FirecrawlClient};
use aeo_perception::{CorrectionGenerator, ScanOrchestrator};
use aeo_profiler::BrandExtractor;
use sqlx::PgPool;

/// Crawl + extract, the two halves of brand analysis.
pub struct Analyzer {
    pub crawler: FirecrawlClient,
    pub extractor: BrandExtractor,
    pub options: CrawlOptions,
}

#[derive(Default)]
pub struct Services {
    pub scans: Option<ScanOrchestrator>,
    pub corrections: Option<CorrectionGenerator>,
    pub analyzer: Option<Analyzer>,
}

impl Services {
    /// Builds every service the configuration allows, logging the rest.
    #[must_use]
    pub fn from_app_config(pool: &PgPool, config: &AppConfig) -> Self {
        let scans = ScanOrchestrator::from_app_config(pool.clone(), config)
            .inspect_err(|e| tracing::warn!(error = %e, "scans disabled"))
            .ok();
        let corrections = CorrectionGenerator::from_app_config(config)
            .inspect_err(|e| tracing::warn!(error = %e, "correction generation disabled"))
            .ok();
        let analyzer = match (
            FirecrawlClient::from_app_config(config),
            BrandExtractor::from_app_config(config),
        ) {
            (Ok(crawler), Ok(extractor)) => Some(Analyzer {
                crawler,
                extractor,
                options: CrawlOptions::from_app_config(config),
            }),
            (Err(e), _) => {
                tracing::warn!(error = %e, "brand analysis disabled");
                None
            }
            (_, Err(e)) => {
                tracing::warn!(error = %e, "brand analysis disabled");
                None
            }
        };

        tracing::info!(
            scans = scans.is_some(),
            corrections = corrections.is_some(),
            analysis = analyzer.is_some(),
            "services configured"
        );
        Self {
            scans,
            corrections,
            analyzer,
        }
    }
}
