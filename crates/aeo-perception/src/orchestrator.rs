//! End-to-end perception scan: prompts × platforms → responses → judge →
//! aggregates → insights.
//!
//! A scan is split into [`ScanOrchestrator::prepare`], which resolves the
//! prompt set and records the `pending` scan, and
//! [`ScanOrchestrator::execute`], which does the slow work. Callers that
//! answer before the scan finishes run `execute` in the background.

use aeo_core::{AppConfig, Platform, PromptCategory, Quadrant};
use aeo_db::{BrandRow, InsightRow, NewResult, PromptRow, ScanCompletion, ScanRow};
use aeo_prompts::GeneratorOptions;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use sqlx::PgPool;

use crate::error::PerceptionError;
use crate::evaluator::{Evaluator, PromptContext};
use crate::ground_truth::{BrandKnowledge, GroundTruth};
use crate::insights::generate_insights;
use crate::platforms::PlatformQuerier;
use crate::prompts::generate_and_store;
use crate::scoring::{aggregate, overall_score, quadrant, AggregatedScores, ResultScores};

/// Prompts generated per category when a brand has none stored.
const AUTO_GENERATE_PER_CATEGORY: usize = 13;

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub platforms: Vec<Platform>,
    /// Empty means every category.
    pub categories: Vec<PromptCategory>,
    /// Restrict the scan to these prompt ids; empty means all active prompts.
    pub prompt_ids: Vec<i64>,
    pub max_prompts: Option<usize>,
    pub trigger_source: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            platforms: vec![Platform::ChatGpt],
            categories: Vec::new(),
            prompt_ids: Vec::new(),
            max_prompts: None,
            trigger_source: "api".to_string(),
        }
    }
}

/// A scan recorded as `pending`, with everything needed to run it.
#[derive(Debug, Clone)]
pub struct PreparedScan {
    pub scan: ScanRow,
    pub prompts: Vec<PromptRow>,
    pub platforms: Vec<Platform>,
    knowledge: BrandKnowledge,
    truth: GroundTruth,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub scan_id: i64,
    pub public_id: uuid::Uuid,
    pub scores: AggregatedScores,
    pub quadrant: Quadrant,
    pub evaluated: usize,
    pub failed: usize,
    #[serde(skip)]
    pub insights: Vec<InsightRow>,
}

pub struct ScanOrchestrator {
    pool: PgPool,
    querier: PlatformQuerier,
    evaluator: Evaluator,
    max_concurrency: usize,
}

impl ScanOrchestrator {
    #[must_use]
    pub fn new(
        pool: PgPool,
        querier: PlatformQuerier,
        evaluator: Evaluator,
        max_concurrency: usize,
    ) -> Self {
        Self {
            pool,
            querier,
            evaluator,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// # Errors
    ///
    /// Returns [`PerceptionError::Llm`] if `OPENAI_API_KEY` is not configured;
    /// responses cannot be judged without it.
    pub fn from_app_config(pool: PgPool, config: &AppConfig) -> Result<Self, PerceptionError> {
        Ok(Self::new(
            pool,
            PlatformQuerier::from_app_config(config),
            Evaluator::from_app_config(config)?,
            config.scan_max_concurrent_queries,
        ))
    }

    /// Prepares and executes a scan in one call.
    ///
    /// # Errors
    ///
    /// See [`Self::prepare`] and [`Self::execute`].
    pub async fn run(
        &self,
        brand: &BrandRow,
        options: &ScanOptions,
    ) -> Result<ScanOutcome, PerceptionError> {
        let prepared = self.prepare(brand, options).await?;
        self.execute(prepared).await
    }

    /// Resolves the prompt set and records a `pending` scan sized
    /// `prompts × platforms`. Brands with no stored prompts get a fresh set
    /// generated first.
    ///
    /// # Errors
    ///
    /// - [`PerceptionError::NoPlatforms`] if `options.platforms` is empty.
    /// - [`PerceptionError::NoPrompts`] if no prompts match even after generation.
    /// - [`PerceptionError::Db`] if a query fails.
    pub async fn prepare(
        &self,
        brand: &BrandRow,
        options: &ScanOptions,
    ) -> Result<PreparedScan, PerceptionError> {
        if options.platforms.is_empty() {
            return Err(PerceptionError::NoPlatforms);
        }

        let knowledge = BrandKnowledge::load(&self.pool, brand.clone()).await?;
        let truth = knowledge.ground_truth();

        let mut prompts = self.load_prompts(brand.id, options).await?;
        if prompts.is_empty() && options.prompt_ids.is_empty() {
            tracing::info!(brand = %brand.slug, "no active prompts; generating");
            let generator = GeneratorOptions {
                categories: PromptCategory::ALL
                    .iter()
                    .copied()
                    .filter(|c| *c != PromptCategory::Functional)
                    .collect(),
                max_per_category: AUTO_GENERATE_PER_CATEGORY,
                review_sites: Vec::new(),
            };
            generate_and_store(&self.pool, &knowledge, &generator).await?;
            prompts = self.load_prompts(brand.id, options).await?;
        }
        if prompts.is_empty() {
            return Err(PerceptionError::NoPrompts(brand.slug.clone()));
        }

        let platform_names: Vec<String> =
            options.platforms.iter().map(ToString::to_string).collect();
        let prompt_count =
            i32::try_from(prompts.len() * options.platforms.len()).unwrap_or(i32::MAX);
        let scan = aeo_db::create_scan(
            &self.pool,
            brand.id,
            &platform_names,
            prompt_count,
            &options.trigger_source,
        )
        .await?;

        tracing::info!(
            brand = %brand.slug,
            scan_id = scan.id,
            prompts = prompts.len(),
            platforms = options.platforms.len(),
            "scan created"
        );

        Ok(PreparedScan {
            scan,
            prompts,
            platforms: options.platforms.clone(),
            knowledge,
            truth,
        })
    }

    async fn load_prompts(
        &self,
        brand_id: i64,
        options: &ScanOptions,
    ) -> Result<Vec<PromptRow>, PerceptionError> {
        let categories: Vec<String> = options.categories.iter().map(ToString::to_string).collect();
        let mut prompts = aeo_db::list_active_prompts(&self.pool, brand_id, &categories).await?;
        if !options.prompt_ids.is_empty() {
            prompts.retain(|p| options.prompt_ids.contains(&p.id));
        }
        if let Some(max) = options.max_prompts {
            prompts = balance_by_category(prompts, max, |p| p.category.clone());
        }
        Ok(prompts)
    }

    /// Runs a prepared scan to completion. Any fatal error marks the scan
    /// `failed` with the error message before it is returned.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`PerceptionError`]. Individual query or
    /// evaluation failures are not fatal unless every one of them fails.
    pub async fn execute(&self, prepared: PreparedScan) -> Result<ScanOutcome, PerceptionError> {
        let scan_id = prepared.scan.id;
        match self.execute_inner(&prepared).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                fail_scan_best_effort(&self.pool, scan_id, &e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn execute_inner(&self, prepared: &PreparedScan) -> Result<ScanOutcome, PerceptionError> {
        let scan = &prepared.scan;
        aeo_db::start_scan(&self.pool, scan.id).await?;

        let jobs: Vec<(&PromptRow, Platform)> = prepared
            .prompts
            .iter()
            .flat_map(|p| prepared.platforms.iter().map(move |platform| (p, *platform)))
            .collect();
        let total = jobs.len();

        // Collected up front: a lazily mapped stream is not `Send` for every
        // borrow lifetime, which callers that spawn `execute` need.
        let evaluations: Vec<_> = jobs
            .into_iter()
            .map(|(prompt, platform)| async move {
                match self.evaluate_one(scan.id, prompt, platform, &prepared.truth).await {
                    Ok(scores) => Some(scores),
                    Err(e) => {
                        tracing::warn!(
                            scan_id = scan.id,
                            prompt_id = prompt.id,
                            %platform,
                            error = %e,
                            "evaluation failed; skipping"
                        );
                        None
                    }
                }
            })
            .collect();
        let results: Vec<Option<ResultScores>> = stream::iter(evaluations)
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let scored: Vec<ResultScores> = results.into_iter().flatten().collect();
        let failed = total - scored.len();
        if scored.is_empty() {
            return Err(PerceptionError::AllEvaluationsFailed(total));
        }
        if failed > 0 {
            tracing::warn!(scan_id = scan.id, failed, total, "some evaluations failed");
        }

        let scores = aggregate(&scored);
        let placement = quadrant(&scores.by_metric);
        let insights = generate_insights(&scores, &scored, &prepared.knowledge.brand.name);
        let new_insights: Vec<_> = insights.iter().map(|i| i.to_new_insight()).collect();
        let insights =
            aeo_db::insert_insights(&self.pool, scan.brand_id, Some(scan.id), &new_insights)
                .await?;

        let completion = ScanCompletion {
            overall_score: scores.overall,
            quadrant: placement.to_string(),
            metrics: serde_json::to_value(scores.by_metric)?,
            platform_scores: serde_json::to_value(&scores.by_platform)?,
            category_scores: serde_json::to_value(&scores.by_category)?,
        };
        aeo_db::complete_scan(&self.pool, scan.id, &completion).await?;

        tracing::info!(
            scan_id = scan.id,
            overall = scores.overall,
            quadrant = %placement,
            insights = insights.len(),
            "scan completed"
        );

        Ok(ScanOutcome {
            scan_id: scan.id,
            public_id: scan.public_id,
            scores,
            quadrant: placement,
            evaluated: scored.len(),
            failed,
            insights,
        })
    }

    /// Query → judge → persist → bump progress for one prompt on one platform.
    async fn evaluate_one(
        &self,
        scan_id: i64,
        prompt: &PromptRow,
        platform: Platform,
        truth: &GroundTruth,
    ) -> Result<ResultScores, PerceptionError> {
        let answer = self.querier.query(&prompt.prompt_text, platform).await?;
        let evaluation = self
            .evaluator
            .evaluate(&PromptContext::from(prompt), &answer.response, truth)
            .await?;
        let m = &evaluation.metrics;

        let evaluation_json = serde_json::json!({
            "judge": evaluation.raw,
            "faithfulnessErrors": m.faithfulness_errors,
            "hallucinations": m.hallucinations,
            "passedTrapTest": m.passed_trap_test,
            "competitorPositions": m.competitor_positions,
            "aspectSentiments": m.aspect_sentiments,
            "voiceDeviations": m.voice_deviations,
            "keyThemes": m.key_themes,
            "missingInformation": m.missing_information,
            "opportunities": m.opportunities,
            "summary": m.summary,
        });

        aeo_db::insert_result(
            &self.pool,
            &NewResult {
                scan_id,
                prompt_id: prompt.id,
                platform: platform.to_string(),
                response: answer.response,
                model: answer.model,
                response_time_ms: answer.response_time_ms,
                faithfulness_score: m.faithfulness_score,
                share_of_voice: m.share_of_voice,
                brand_mentioned: m.brand_mentioned,
                brand_position: m.brand_position,
                competitors_mentioned: serde_json::to_value(&m.competitors_mentioned)?,
                sentiment_score: m.sentiment,
                sentiment_label: m.sentiment_label.clone(),
                voice_alignment_score: m.voice_alignment_score,
                hallucination_score: m.hallucination_score,
                hallucination_detected: m.hallucination_detected(),
                overall_score: overall_score(m),
                evaluation: evaluation_json,
            },
        )
        .await?;
        aeo_db::increment_scan_progress(&self.pool, scan_id).await?;

        Ok(ResultScores::from_metrics(
            platform.as_str(),
            &prompt.category,
            m,
        ))
    }
}

async fn fail_scan_best_effort(pool: &PgPool, scan_id: i64, message: &str) {
    if let Err(e) = aeo_db::fail_scan(pool, scan_id, message).await {
        tracing::error!(scan_id, error = %e, "failed to mark scan as failed");
    }
}

/// Caps `items` at `max` while keeping every group represented: up to
/// `ceil(max / groups)` items are taken from each group, groups in order of
/// first appearance, then the list is cut to `max`. Order within a group is
/// preserved.
pub fn balance_by_category<T, K, F>(items: Vec<T>, max: usize, key: F) -> Vec<T>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    if items.len() <= max {
        return items;
    }

    let mut groups: Vec<(K, Vec<T>)> = Vec::new();
    for item in items {
        let k = key(&item);
        match groups.iter_mut().find(|(g, _)| *g == k) {
            Some((_, members)) => members.push(item),
            None => groups.push((k, vec![item])),
        }
    }

    let per_group = max.div_ceil(groups.len().max(1));
    let mut selected: Vec<T> = groups
        .into_iter()
        .flat_map(|(_, members)| members.into_iter().take(per_group))
        .collect();
    selected.truncate(max);
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_is_noop_under_limit() {
        let items = vec![("a", 1), ("b", 2)];
        assert_eq!(balance_by_category(items.clone(), 5, |i| i.0), items);
    }

    #[test]
    fn balance_takes_from_every_category() {
        let items = vec![
            ("nav", 1),
            ("nav", 2),
            ("nav", 3),
            ("nav", 4),
            ("adv", 5),
            ("adv", 6),
            ("voice", 7),
        ];
        // ceil(5 / 3) = 2 per category, then cut to 5
        let picked: Vec<i32> = balance_by_category(items, 5, |i| i.0)
            .into_iter()
            .map(|i| i.1)
            .collect();
        assert_eq!(picked, vec![1, 2, 5, 6, 7]);
    }

    #[test]
    fn balance_truncates_when_groups_overfill() {
        let items: Vec<(&str, i32)> = (0..6)
            .map(|n| (if n % 2 == 0 { "a" } else { "b" }, n))
            .collect();
        // ceil(3 / 2) = 2 per group gives 4, cut to 3
        let picked: Vec<i32> = balance_by_category(items, 3, |i| i.0)
            .into_iter()
            .map(|i| i.1)
            .collect();
        assert_eq!(picked, vec![0, 2, 1]);
    }

    #[test]
    fn default_options_scan_chatgpt() {
        let options = ScanOptions::default();
        assert_eq!(options.platforms, vec![Platform::ChatGpt]);
        assert_eq!(options.trigger_source, "api");
        assert!(options.max_prompts.is_none());
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn scan_futures_can_be_spawned() {
        // Type-checked only; spawning a scan needs these futures to be `Send`.
        let _ = |orchestrator: &ScanOrchestrator, prepared: PreparedScan| {
            assert_send(&orchestrator.execute(prepared));
        };
        let _ = |orchestrator: &ScanOrchestrator, brand: &BrandRow, options: &ScanOptions| {
            assert_send(&orchestrator.run(brand, options));
        };
    }
}
