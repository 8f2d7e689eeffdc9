//! Brand summary report: latest scores, movement since the previous scan,
//! and the open work.

use std::collections::BTreeMap;
use std::str::FromStr;

use aeo_core::InsightPriority;
use aeo_db::{CorrectionRow, InsightRow, ScanRow};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::PerceptionError;
use crate::metrics::round_to_i32;
use crate::scoring::{average, ResultScores};

const TOP_INSIGHTS: usize = 5;
const RECENT_CORRECTIONS: usize = 5;
const QUADRANT_HISTORY: usize = 10;
const SCAN_WINDOW: i64 = 200;
const ROW_WINDOW: i64 = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DateRange {
    #[serde(rename = "7d")]
    Week,
    #[default]
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "90d")]
    Quarter,
    #[serde(rename = "all")]
    All,
}

impl DateRange {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DateRange::Week => "7d",
            DateRange::Month => "30d",
            DateRange::Quarter => "90d",
            DateRange::All => "all",
        }
    }

    /// Start of the window, or `None` for all time.
    #[must_use]
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            DateRange::Week => Some(now - Duration::days(7)),
            DateRange::Month => Some(now - Duration::days(30)),
            DateRange::Quarter => Some(now - Duration::days(90)),
            DateRange::All => None,
        }
    }
}

impl FromStr for DateRange {
    type Err = PerceptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(DateRange::Week),
            "30d" => Ok(DateRange::Month),
            "90d" => Ok(DateRange::Quarter),
            "all" => Ok(DateRange::All),
            other => Err(PerceptionError::InvalidStoredValue(format!(
                "invalid date range: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Report shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub overall_score: i32,
    pub score_change: i32,
    pub quadrant: String,
    pub previous_quadrant: Option<String>,
    pub quadrant_changed: bool,
    pub total_scans: usize,
    pub date_range: DateRange,
    pub last_scan_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformBreakdown {
    pub score: i32,
    pub previous_score: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub score: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopInsight {
    pub id: Uuid,
    pub title: String,
    pub category: String,
    pub priority: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentCorrection {
    pub id: Uuid,
    pub problem_type: String,
    pub status: String,
    pub pre_fix_score: Option<i32>,
    pub post_fix_score: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuadrantPoint {
    pub scan_id: Uuid,
    pub date: DateTime<Utc>,
    pub quadrant: Option<String>,
    pub overall_score: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub summary: ReportSummary,
    pub platform_breakdown: BTreeMap<String, PlatformBreakdown>,
    pub category_breakdown: BTreeMap<String, CategoryBreakdown>,
    pub top_insights: Vec<TopInsight>,
    pub recent_corrections: Vec<RecentCorrection>,
    pub quadrant_history: Vec<QuadrantPoint>,
    pub insight_counts: BTreeMap<String, usize>,
    pub correction_counts: BTreeMap<String, usize>,
}

/// What a report is built from. `scans` are the completed scans in range,
/// newest first; the result slices belong to the first two of them.
pub struct ReportInputs<'a> {
    pub range: DateRange,
    pub scans: &'a [ScanRow],
    pub latest_results: &'a [ResultScores],
    pub previous_results: &'a [ResultScores],
    pub insights: &'a [InsightRow],
    pub corrections: &'a [CorrectionRow],
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

#[must_use]
pub fn build_summary(inputs: &ReportInputs<'_>) -> SummaryReport {
    let latest = inputs.scans.first();
    let previous = inputs.scans.get(1);

    let overall_score = latest.and_then(|s| s.overall_score).unwrap_or(0);
    let score_change = match latest {
        Some(_) => overall_score - previous.and_then(|s| s.overall_score).unwrap_or(0),
        None => 0,
    };
    let quadrant = latest
        .and_then(|s| s.quadrant.clone())
        .unwrap_or_else(|| "invisible".to_string());
    let previous_quadrant = previous.and_then(|s| s.quadrant.clone());
    let quadrant_changed = previous_quadrant
        .as_deref()
        .is_some_and(|prev| prev != quadrant);

    let current_platforms = mean_by(inputs.latest_results, |r| &r.platform);
    let previous_platforms = mean_by(inputs.previous_results, |r| &r.platform);
    let platform_breakdown = current_platforms
        .into_iter()
        .map(|(platform, (score, _))| {
            let previous_score = previous_platforms.get(&platform).map(|(s, _)| *s);
            (platform, PlatformBreakdown { score, previous_score })
        })
        .collect();

    let category_breakdown = mean_by(inputs.latest_results, |r| &r.category)
        .into_iter()
        .map(|(category, (score, count))| (category, CategoryBreakdown { score, count }))
        .collect();

    let mut open: Vec<&InsightRow> = inputs
        .insights
        .iter()
        .filter(|i| matches!(i.status.as_str(), "open" | "in_progress"))
        .collect();
    open.sort_by(|a, b| {
        priority_rank(&a.priority)
            .cmp(&priority_rank(&b.priority))
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    let top_insights = open
        .into_iter()
        .take(TOP_INSIGHTS)
        .map(|i| TopInsight {
            id: i.public_id,
            title: i.title.clone(),
            category: i.category.clone(),
            priority: i.priority.clone(),
            impact: i.impact.clone(),
        })
        .collect();

    let mut corrections: Vec<&CorrectionRow> = inputs.corrections.iter().collect();
    corrections.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    let recent_corrections = corrections
        .into_iter()
        .take(RECENT_CORRECTIONS)
        .map(|c| RecentCorrection {
            id: c.public_id,
            problem_type: c.problem_type.clone(),
            status: c.status.clone(),
            pre_fix_score: c.pre_fix_score,
            post_fix_score: c.post_fix_score,
            updated_at: c.updated_at,
        })
        .collect();

    let quadrant_history = inputs
        .scans
        .iter()
        .take(QUADRANT_HISTORY)
        .map(|s| QuadrantPoint {
            scan_id: s.public_id,
            date: s.created_at,
            quadrant: s.quadrant.clone(),
            overall_score: s.overall_score,
        })
        .collect();

    SummaryReport {
        summary: ReportSummary {
            overall_score,
            score_change,
            quadrant,
            previous_quadrant,
            quadrant_changed,
            total_scans: inputs.scans.len(),
            date_range: inputs.range,
            last_scan_at: latest.map(|s| s.completed_at.unwrap_or(s.created_at)),
        },
        platform_breakdown,
        category_breakdown,
        top_insights,
        recent_corrections,
        quadrant_history,
        insight_counts: count_by(inputs.insights.iter().map(|i| i.status.as_str())),
        correction_counts: count_by(inputs.corrections.iter().map(|c| c.status.as_str())),
    }
}

fn priority_rank(priority: &str) -> u8 {
    priority
        .parse::<InsightPriority>()
        .map_or(u8::MAX, InsightPriority::rank)
}

/// Rounded simple-mean score and result count per key.
fn mean_by(
    results: &[ResultScores],
    key: fn(&ResultScores) -> &String,
) -> BTreeMap<String, (i32, usize)> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for result in results {
        groups
            .entry(key(result).clone())
            .or_default()
            .push(result.simple_mean());
    }
    groups
        .into_iter()
        .map(|(k, scores)| {
            let count = scores.len();
            (k, (round_to_i32(average(scores.into_iter())), count))
        })
        .collect()
}

fn count_by<'a>(values: impl Iterator<Item = &'a str>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(value.to_string()).or_default() += 1;
    }
    counts
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Builds the summary report for `brand_id` over `range`.
///
/// # Errors
///
/// Returns [`PerceptionError::Db`] if any query fails.
pub async fn load_summary(
    pool: &PgPool,
    brand_id: i64,
    range: DateRange,
) -> Result<SummaryReport, PerceptionError> {
    let since = range.since(Utc::now());
    let scans: Vec<ScanRow> = aeo_db::latest_completed_scans(pool, brand_id, SCAN_WINDOW)
        .await?
        .into_iter()
        .filter(|s| since.is_none_or(|start| s.created_at >= start))
        .collect();

    let mut results = Vec::with_capacity(2);
    for scan in scans.iter().take(2) {
        let rows = aeo_db::list_results_for_scan(pool, scan.id).await?;
        results.push(rows.iter().map(ResultScores::from_row).collect::<Vec<_>>());
    }
    let latest_results = results.first().map_or(&[][..], Vec::as_slice);
    let previous_results = results.get(1).map_or(&[][..], Vec::as_slice);

    let insights = aeo_db::list_insights_for_brand(pool, brand_id, None, ROW_WINDOW).await?;
    let corrections = aeo_db::list_corrections_for_brand(pool, brand_id, None, ROW_WINDOW).await?;

    Ok(build_summary(&ReportInputs {
        range,
        scans: &scans,
        latest_results,
        previous_results,
        insights: &insights,
        corrections: &corrections,
    }))
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
