//! Scan-to-scan comparison.
//!
//! Comparisons work from per-result scores rather than the stored
//! aggregates, so platform and category movements use the plain mean of the
//! five metrics (sentiment normalised to 0..100) instead of the weighted
//! overall.

use std::collections::{BTreeMap, BTreeSet};

use aeo_db::{InsightRow, ScanRow, ScoredResultRow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::PerceptionError;
use crate::metrics::round_to_i32;
use crate::scoring::{average, ResultScores};

/// How many of a brand's insights are considered when diffing two scans.
const INSIGHT_WINDOW: i64 = 500;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A scan together with the scores of every result it produced.
#[derive(Debug, Clone)]
pub struct ScanSnapshot {
    pub public_id: Uuid,
    pub brand_id: i64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub overall_score: Option<i32>,
    pub quadrant: Option<String>,
    pub results: Vec<ResultScores>,
}

impl ScanSnapshot {
    #[must_use]
    pub fn new(scan: &ScanRow, results: &[ScoredResultRow]) -> Self {
        Self {
            public_id: scan.public_id,
            brand_id: scan.brand_id,
            created_at: scan.created_at,
            completed_at: scan.completed_at,
            overall_score: scan.overall_score,
            quadrant: scan.quadrant.clone(),
            results: results.iter().map(ResultScores::from_row).collect(),
        }
    }

    /// Insights created at or before this instant belong to this scan or
    /// an earlier one.
    fn cutoff(&self) -> DateTime<Utc> {
        self.completed_at.unwrap_or(self.created_at)
    }

    fn summary(&self) -> ScanSummary {
        ScanSummary {
            id: self.public_id,
            created_at: self.created_at,
            completed_at: self.completed_at,
            overall_score: self.overall_score,
            quadrant: self.quadrant.clone(),
            result_count: self.results.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub overall_score: Option<i32>,
    pub quadrant: Option<String>,
    pub result_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricChange {
    pub current: f64,
    pub previous: f64,
    pub change: f64,
    pub change_percent: f64,
    pub improved: bool,
}

impl MetricChange {
    fn between(previous: f64, current: f64) -> Self {
        let change_percent = if previous.abs() < f64::EPSILON {
            0.0
        } else {
            round2((current - previous) / previous.abs() * 100.0)
        };
        Self {
            current,
            previous,
            change: round2(current - previous),
            change_percent,
            improved: current > previous,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreChange {
    pub name: String,
    pub current: i32,
    pub previous: i32,
    pub change: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuadrantChange {
    pub previous: Option<String>,
    pub current: Option<String>,
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightRef {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub priority: String,
    pub status: String,
}

impl From<&InsightRow> for InsightRef {
    fn from(row: &InsightRow) -> Self {
        Self {
            id: row.public_id,
            title: row.title.clone(),
            category: row.category.clone(),
            priority: row.priority.clone(),
            status: row.status.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanComparison {
    pub earlier: ScanSummary,
    pub later: ScanSummary,
    pub overall: MetricChange,
    pub quadrant: QuadrantChange,
    pub metrics: BTreeMap<&'static str, MetricChange>,
    pub platforms: Vec<ScoreChange>,
    pub categories: Vec<ScoreChange>,
    pub new_insights: Vec<InsightRef>,
    pub resolved_insights: Vec<InsightRef>,
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// Compares `later` against `earlier`.
///
/// `insights` is the brand's insight history. An insight is new if it was
/// created after the earlier scan's cutoff and no later than the later
/// scan's; it counts as resolved if it already existed at the earlier
/// cutoff and has since been resolved or dismissed.
#[must_use]
pub fn compare_scans(
    earlier: &ScanSnapshot,
    later: &ScanSnapshot,
    insights: &[InsightRow],
) -> ScanComparison {
    let previous = metric_averages(&earlier.results);
    let current = metric_averages(&later.results);
    let metrics = previous
        .iter()
        .zip(current.iter())
        .map(|((name, before), (_, after))| (*name, MetricChange::between(*before, *after)))
        .collect();

    let (earlier_cutoff, later_cutoff) = (earlier.cutoff(), later.cutoff());
    let new_insights = insights
        .iter()
        .filter(|i| i.created_at > earlier_cutoff && i.created_at <= later_cutoff)
        .map(InsightRef::from)
        .collect();
    let resolved_insights = insights
        .iter()
        .filter(|i| {
            i.created_at <= earlier_cutoff
                && matches!(i.status.as_str(), "resolved" | "dismissed")
                && i.updated_at > earlier_cutoff
        })
        .map(InsightRef::from)
        .collect();

    ScanComparison {
        earlier: earlier.summary(),
        later: later.summary(),
        overall: MetricChange::between(
            f64::from(earlier.overall_score.unwrap_or(0)),
            f64::from(later.overall_score.unwrap_or(0)),
        ),
        quadrant: QuadrantChange {
            previous: earlier.quadrant.clone(),
            current: later.quadrant.clone(),
            changed: earlier.quadrant != later.quadrant,
        },
        metrics,
        platforms: score_changes(&earlier.results, &later.results, |r| &r.platform),
        categories: score_changes(&earlier.results, &later.results, |r| &r.category),
        new_insights,
        resolved_insights,
    }
}

/// Raw metric means: percent scores rounded to integers, sentiment
/// (`-1..=1`) to two decimals. An empty scan averages to zero.
fn metric_averages(results: &[ResultScores]) -> [(&'static str, f64); 5] {
    let mean = |f: fn(&ResultScores) -> f64| average(results.iter().map(f));
    [
        ("faithfulness", mean(|r| r.faithfulness).round()),
        ("share_of_voice", mean(|r| r.share_of_voice).round()),
        ("sentiment", round2(mean(|r| r.sentiment))),
        ("voice_alignment", mean(|r| r.voice_alignment).round()),
        ("hallucination_score", mean(|r| r.hallucination).round()),
    ]
}

fn score_changes(
    earlier: &[ResultScores],
    later: &[ResultScores],
    key: fn(&ResultScores) -> &String,
) -> Vec<ScoreChange> {
    let before = mean_by(earlier, key);
    let after = mean_by(later, key);
    let names: BTreeSet<&String> = before.keys().chain(after.keys()).copied().collect();
    names
        .into_iter()
        .map(|name| {
            let previous = before.get(name).copied().unwrap_or(0);
            let current = after.get(name).copied().unwrap_or(0);
            ScoreChange {
                name: name.clone(),
                current,
                previous,
                change: current - previous,
            }
        })
        .collect()
}

fn mean_by(results: &[ResultScores], key: fn(&ResultScores) -> &String) -> BTreeMap<&String, i32> {
    let mut groups: BTreeMap<&String, Vec<f64>> = BTreeMap::new();
    for result in results {
        groups.entry(key(result)).or_default().push(result.simple_mean());
    }
    groups
        .into_iter()
        .map(|(k, v)| (k, round_to_i32(average(v.into_iter()))))
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Loads a scan and its results.
///
/// # Errors
///
/// Returns [`PerceptionError::ScanNotFound`] for an unknown id, or
/// [`PerceptionError::Db`] if a query fails.
pub async fn load_snapshot(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<ScanSnapshot, PerceptionError> {
    let scan = aeo_db::get_scan(pool, public_id)
        .await?
        .ok_or(PerceptionError::ScanNotFound(public_id))?;
    let results = aeo_db::list_results_for_scan(pool, scan.id).await?;
    Ok(ScanSnapshot::new(&scan, &results))
}

/// Compares two scans of `brand_id`. With explicit ids the first is treated
/// as the earlier scan; otherwise the brand's two most recently completed
/// scans are used.
///
/// # Errors
///
/// - [`PerceptionError::ScanNotFound`] if an explicit id is unknown.
/// - [`PerceptionError::ScanBrandMismatch`] if a scan belongs to another brand.
/// - [`PerceptionError::NotEnoughScans`] if fewer than two completed scans exist.
pub async fn compare_for_brand(
    pool: &PgPool,
    brand_id: i64,
    scan_ids: Option<(Uuid, Uuid)>,
) -> Result<ScanComparison, PerceptionError> {
    let (earlier, later) = match scan_ids {
        Some((earlier, later)) => (
            load_snapshot(pool, earlier).await?,
            load_snapshot(pool, later).await?,
        ),
        None => {
            let recent = aeo_db::latest_completed_scans(pool, brand_id, 2).await?;
            let [later, earlier] = recent.as_slice() else {
                return Err(PerceptionError::NotEnoughScans(recent.len()));
            };
            (
                ScanSnapshot::new(earlier, &aeo_db::list_results_for_scan(pool, earlier.id).await?),
                ScanSnapshot::new(later, &aeo_db::list_results_for_scan(pool, later.id).await?),
            )
        }
    };

    if earlier.brand_id != brand_id || later.brand_id != brand_id {
        return Err(PerceptionError::ScanBrandMismatch);
    }

    let insights = aeo_db::list_insights_for_brand(pool, brand_id, None, INSIGHT_WINDOW).await?;
    tracing::debug!(
        earlier = %earlier.public_id,
        later = %later.public_id,
        insights = insights.len(),
        "comparing scans"
    );
    Ok(compare_scans(&earlier, &later, &insights))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn result(platform: &str, category: &str, scores: [f64; 5]) -> ResultScores {
        ResultScores {
            platform: platform.to_string(),
            category: category.to_string(),
            faithfulness: scores[0],
            share_of_voice: scores[1],
            sentiment: scores[2],
            voice_alignment: scores[3],
            hallucination: scores[4],
            competitors_mentioned: vec![],
        }
    }

    fn snapshot(
        completed_at: DateTime<Utc>,
        overall: Option<i32>,
        quadrant: &str,
        results: Vec<ResultScores>,
    ) -> ScanSnapshot {
        ScanSnapshot {
            public_id: Uuid::new_v4(),
            brand_id: 1,
            created_at: completed_at - Duration::minutes(5),
            completed_at: Some(completed_at),
            overall_score: overall,
            quadrant: Some(quadrant.to_string()),
            results,
        }
    }

    fn insight(
        title: &str,
        status: &str,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> InsightRow {
        InsightRow {
            id: 1,
            public_id: Uuid::new_v4(),
            brand_id: 1,
            scan_id: None,
            category: "visibility".to_string(),
            priority: "critical".to_string(),
            status: status.to_string(),
            title: title.to_string(),
            description: String::new(),
            impact: String::new(),
            recommendation: String::new(),
            current_value: None,
            target_value: None,
            effort: "high".to_string(),
            affected_platforms: vec![],
            affected_categories: vec![],
            resolved_at: None,
            created_at,
            updated_at,
        }
    }

    #[test]
    fn overall_change_and_percent() {
        let t0 = Utc::now() - Duration::days(7);
        let earlier = snapshot(t0, Some(50), "niche", vec![]);
        let later = snapshot(t0 + Duration::days(7), Some(60), "dominant", vec![]);
        let cmp = compare_scans(&earlier, &later, &[]);

        assert!((cmp.overall.change - 10.0).abs() < f64::EPSILON);
        assert!((cmp.overall.change_percent - 20.0).abs() < f64::EPSILON);
        assert!(cmp.overall.improved);
        assert!(cmp.quadrant.changed);
        assert_eq!(cmp.quadrant.previous.as_deref(), Some("niche"));
        assert_eq!(cmp.earlier.result_count, 0);
    }

    #[test]
    fn zero_previous_score_has_zero_percent() {
        let t0 = Utc::now();
        let earlier = snapshot(t0, None, "invisible", vec![]);
        let later = snapshot(t0 + Duration::hours(1), Some(40), "invisible", vec![]);
        let cmp = compare_scans(&earlier, &later, &[]);
        assert!(cmp.overall.change_percent.abs() < f64::EPSILON);
        assert!(!cmp.quadrant.changed);
    }

    #[test]
    fn metric_averages_keep_raw_sentiment() {
        let t0 = Utc::now();
        let earlier = snapshot(
            t0,
            Some(50),
            "niche",
            vec![result("chatgpt", "navigational", [60.0, 20.0, -0.25, 50.0, 80.0])],
        );
        let later = snapshot(
            t0 + Duration::hours(1),
            Some(55),
            "niche",
            vec![
                result("chatgpt", "navigational", [80.0, 40.0, 0.5, 70.0, 90.0]),
                result("chatgpt", "navigational", [70.0, 30.0, 0.2, 60.0, 100.0]),
            ],
        );
        let cmp = compare_scans(&earlier, &later, &[]);

        let faith = cmp.metrics["faithfulness"];
        assert!((faith.previous - 60.0).abs() < f64::EPSILON);
        assert!((faith.current - 75.0).abs() < f64::EPSILON);
        assert!((faith.change_percent - 25.0).abs() < f64::EPSILON);

        let sentiment = cmp.metrics["sentiment"];
        assert!((sentiment.previous + 0.25).abs() < 1e-9);
        assert!((sentiment.current - 0.35).abs() < 1e-9);
        assert!((sentiment.change - 0.6).abs() < 1e-9);
        // relative to |previous|
        assert!((sentiment.change_percent - 240.0).abs() < 1e-9);
        assert!(sentiment.improved);

        assert!((cmp.metrics["hallucination_score"].current - 95.0).abs() < f64::EPSILON);
    }

    #[test]
    fn platform_changes_cover_union_of_keys() {
        let t0 = Utc::now();
        let earlier = snapshot(
            t0,
            Some(50),
            "niche",
            vec![result("chatgpt", "navigational", [50.0, 50.0, 0.0, 50.0, 50.0])],
        );
        let later = snapshot(
            t0 + Duration::hours(1),
            Some(50),
            "niche",
            vec![
                result("chatgpt", "voice", [70.0, 70.0, 0.4, 70.0, 70.0]),
                result("claude", "voice", [60.0, 60.0, 0.2, 60.0, 60.0]),
            ],
        );
        let cmp = compare_scans(&earlier, &later, &[]);

        let names: Vec<&str> = cmp.platforms.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["chatgpt", "claude"]);
        assert_eq!(cmp.platforms[0].previous, 50);
        assert_eq!(cmp.platforms[0].current, 70);
        assert_eq!(cmp.platforms[0].change, 20);
        assert_eq!(cmp.platforms[1].previous, 0);
        assert_eq!(cmp.platforms[1].current, 60);

        let categories: Vec<&str> = cmp.categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(categories, vec!["navigational", "voice"]);
        assert_eq!(cmp.categories[0].current, 0);
        assert_eq!(cmp.categories[1].current, 65);
    }

    #[test]
    fn insights_split_into_new_and_resolved() {
        let t0 = Utc::now() - Duration::days(14);
        let t1 = t0 + Duration::days(7);
        let earlier = snapshot(t0, Some(40), "niche", vec![]);
        let later = snapshot(t1, Some(60), "dominant", vec![]);

        let insights = vec![
            insight("old, still open", "open", t0 - Duration::days(1), t0),
            insight(
                "old, resolved since",
                "resolved",
                t0 - Duration::days(1),
                t0 + Duration::days(2),
            ),
            insight(
                "old, dismissed before",
                "dismissed",
                t0 - Duration::days(2),
                t0 - Duration::days(1),
            ),
            insight("raised by later scan", "open", t1 - Duration::minutes(1), t1),
            insight("after later scan", "open", t1 + Duration::days(1), t1 + Duration::days(1)),
        ];
        let cmp = compare_scans(&earlier, &later, &insights);

        let new: Vec<&str> = cmp.new_insights.iter().map(|i| i.title.as_str()).collect();
        let resolved: Vec<&str> = cmp.resolved_insights.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(new, vec!["raised by later scan"]);
        assert_eq!(resolved, vec!["old, resolved since"]);
    }
}
