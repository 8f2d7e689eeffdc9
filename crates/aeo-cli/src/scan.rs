//! `scan`: run a perception scan from the terminal.

use aeo_core::Platform;
use aeo_perception::orchestrator::balance_by_category;
use aeo_perception::{ScanOptions, ScanOrchestrator};

use crate::load_brand;

const TRIGGER_SOURCE: &str = "cli";

/// Scan parameters taken from the command line.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScanPlan {
    /// Empty means the default platform set.
    pub platforms: Vec<Platform>,
    pub max_prompts: Option<usize>,
}

impl ScanPlan {
    pub(crate) fn to_options(&self) -> ScanOptions {
        let mut options = ScanOptions {
            max_prompts: self.max_prompts.filter(|n| *n > 0),
            trigger_source: TRIGGER_SOURCE.to_string(),
            ..ScanOptions::default()
        };
        if !self.platforms.is_empty() {
            let mut platforms = Vec::with_capacity(self.platforms.len());
            for p in &self.platforms {
                if !platforms.contains(p) {
                    platforms.push(*p);
                }
            }
            options.platforms = platforms;
        }
        options
    }
}

/// Prints what a scan would run without creating it.
///
/// # Errors
///
/// Returns an error if the brand is unknown or the prompt query fails.
pub(crate) async fn run_scan_dry_run(
    pool: &sqlx::PgPool,
    slug: &str,
    plan: &ScanPlan,
) -> anyhow::Result<()> {
    let brand = load_brand(pool, slug).await?;
    let options = plan.to_options();

    let mut prompts = aeo_db::list_active_prompts(pool, brand.id, &[]).await?;
    if let Some(max) = options.max_prompts {
        prompts = balance_by_category(prompts, max, |p| p.category.clone());
    }

    let platforms: Vec<&str> = options.platforms.iter().map(|p| p.as_str()).collect();
    if prompts.is_empty() {
        println!(
            "dry-run: '{}' has no active prompts; a real scan would generate them first",
            brand.slug
        );
    } else {
        println!(
            "dry-run: would run {} prompts on [{}] ({} queries) for '{}'",
            prompts.len(),
            platforms.join(", "),
            prompts.len() * platforms.len(),
            brand.slug
        );
    }
    Ok(())
}

/// Runs a scan to completion and prints its scores.
///
/// # Errors
///
/// Returns an error if the brand is unknown, `OPENAI_API_KEY` is missing, or
/// the scan fails.
pub(crate) async fn run_scan(
    pool: &sqlx::PgPool,
    config: &aeo_core::AppConfig,
    slug: &str,
    plan: &ScanPlan,
) -> anyhow::Result<()> {
    let brand = load_brand(pool, slug).await?;
    let orchestrator = ScanOrchestrator::from_app_config(pool.clone(), config)?;

    let outcome = orchestrator.run(&brand, &plan.to_options()).await?;

    println!(
        "scan {} complete: overall {} ({}), {} evaluated, {} failed",
        outcome.public_id,
        outcome.scores.overall,
        outcome.quadrant.as_str(),
        outcome.evaluated,
        outcome.failed
    );
    let metrics = &outcome.scores.by_metric;
    println!("{:<22}SCORE", "METRIC");
    for (name, score) in [
        ("faithfulness", metrics.faithfulness),
        ("share_of_voice", metrics.share_of_voice),
        ("sentiment", metrics.sentiment),
        ("voice_alignment", metrics.voice_alignment),
        ("hallucination_risk", metrics.hallucination_risk),
    ] {
        println!("{name:<22}{score}");
    }
    if !outcome.insights.is_empty() {
        println!("\n{} insights:", outcome.insights.len());
        for insight in &outcome.insights {
            println!("  [{}] {}", insight.priority, insight.title);
        }
    }
    Ok(())
}
