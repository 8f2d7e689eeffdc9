//! Score aggregation and quadrant placement.

use std::collections::BTreeMap;

use aeo_core::Quadrant;
use aeo_db::ScoredResultRow;
use serde::{Deserialize, Serialize};

use crate::metrics::{round_to_i32, EvaluationMetrics};

const WEIGHT_FAITHFULNESS: f64 = 0.25;
const WEIGHT_SHARE_OF_VOICE: f64 = 0.25;
const WEIGHT_SENTIMENT: f64 = 0.15;
const WEIGHT_VOICE: f64 = 0.15;
const WEIGHT_HALLUCINATION: f64 = 0.20;

const VISIBILITY_THRESHOLD: f64 = 50.0;
const ACCURACY_THRESHOLD: f64 = 70.0;

/// The numeric part of one evaluated response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultScores {
    pub platform: String,
    pub category: String,
    pub faithfulness: f64,
    pub share_of_voice: f64,
    pub sentiment: f64,
    pub voice_alignment: f64,
    pub hallucination: f64,
    pub competitors_mentioned: Vec<String>,
}

impl ResultScores {
    #[must_use]
    pub fn from_metrics(platform: &str, category: &str, m: &EvaluationMetrics) -> Self {
        Self {
            platform: platform.to_string(),
            category: category.to_string(),
            faithfulness: m.faithfulness_score,
            share_of_voice: m.share_of_voice,
            sentiment: m.sentiment,
            voice_alignment: m.voice_alignment_score,
            hallucination: m.hallucination_score,
            competitors_mentioned: m.competitors_mentioned.clone(),
        }
    }

    #[must_use]
    pub fn from_row(row: &ScoredResultRow) -> Self {
        let competitors_mentioned = row
            .competitors_mentioned
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Self {
            platform: row.platform.clone(),
            category: row.category.clone(),
            faithfulness: row.faithfulness_score,
            share_of_voice: row.share_of_voice,
            sentiment: row.sentiment_score,
            voice_alignment: row.voice_alignment_score,
            hallucination: row.hallucination_score,
            competitors_mentioned,
        }
    }

    /// Weighted overall score for this response.
    #[must_use]
    pub fn overall(&self) -> i32 {
        round_to_i32(weighted(
            self.faithfulness,
            self.share_of_voice,
            self.sentiment,
            self.voice_alignment,
            self.hallucination,
        ))
    }

    /// Unweighted mean of the five metrics, sentiment normalised to 0..100.
    /// Used for scan-to-scan comparisons.
    #[must_use]
    pub fn simple_mean(&self) -> f64 {
        (self.faithfulness
            + self.share_of_voice
            + normalize_sentiment(self.sentiment)
            + self.voice_alignment
            + self.hallucination)
            / 5.0
    }
}

/// Maps a `-1..=1` sentiment onto `0..=100`.
#[must_use]
pub fn normalize_sentiment(sentiment: f64) -> f64 {
    (sentiment + 1.0) / 2.0 * 100.0
}

fn weighted(faithfulness: f64, sov: f64, sentiment: f64, voice: f64, hallucination: f64) -> f64 {
    faithfulness * WEIGHT_FAITHFULNESS
        + sov * WEIGHT_SHARE_OF_VOICE
        + normalize_sentiment(sentiment) * WEIGHT_SENTIMENT
        + voice * WEIGHT_VOICE
        + hallucination * WEIGHT_HALLUCINATION
}

/// `round(0.25·faith + 0.25·sov + 0.15·sentiment₀₋₁₀₀ + 0.15·voice + 0.20·hallucination)`.
#[must_use]
pub fn overall_score(m: &EvaluationMetrics) -> i32 {
    round_to_i32(weighted(
        m.faithfulness_score,
        m.share_of_voice,
        m.sentiment,
        m.voice_alignment_score,
        m.hallucination_score,
    ))
}

/// Scan-level metric averages, each rounded to an integer. `sentiment` is
/// normalised to 0..100 and `hallucination_risk` is `100 − avg hallucination`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricScores {
    pub faithfulness: i32,
    pub share_of_voice: i32,
    pub sentiment: i32,
    pub voice_alignment: i32,
    pub hallucination_risk: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedScores {
    pub overall: i32,
    pub by_platform: BTreeMap<String, i32>,
    pub by_category: BTreeMap<String, i32>,
    pub by_metric: MetricScores,
}

/// Aggregates a scan's results. An empty scan scores zero everywhere.
#[must_use]
pub fn aggregate(results: &[ResultScores]) -> AggregatedScores {
    if results.is_empty() {
        return AggregatedScores::default();
    }

    let mean = |f: fn(&ResultScores) -> f64| average(results.iter().map(f));
    let faithfulness = mean(|r| r.faithfulness);
    let share_of_voice = mean(|r| r.share_of_voice);
    let sentiment = normalize_sentiment(mean(|r| r.sentiment));
    let voice_alignment = mean(|r| r.voice_alignment);
    let hallucination = mean(|r| r.hallucination);
    let hallucination_risk = 100 - round_to_i32(hallucination);

    // `100 − risk` on the unrounded mean is the mean itself.
    let overall = round_to_i32(
        faithfulness * WEIGHT_FAITHFULNESS
            + share_of_voice * WEIGHT_SHARE_OF_VOICE
            + sentiment * WEIGHT_SENTIMENT
            + voice_alignment * WEIGHT_VOICE
            + hallucination * WEIGHT_HALLUCINATION,
    );

    AggregatedScores {
        overall,
        by_platform: group_average(results, |r| r.platform.as_str()),
        by_category: group_average(results, |r| r.category.as_str()),
        by_metric: MetricScores {
            faithfulness: round_to_i32(faithfulness),
            share_of_voice: round_to_i32(share_of_voice),
            sentiment: round_to_i32(sentiment),
            voice_alignment: round_to_i32(voice_alignment),
            hallucination_risk,
        },
    }
}

/// Average per-result overall score for each key.
fn group_average<'a>(
    results: &'a [ResultScores],
    key: impl Fn(&'a ResultScores) -> &'a str,
) -> BTreeMap<String, i32> {
    let mut groups: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for result in results {
        groups
            .entry(key(result))
            .or_default()
            .push(f64::from(result.overall()));
    }
    groups
        .into_iter()
        .map(|(k, scores)| (k.to_string(), round_to_i32(average(scores.into_iter()))))
        .collect()
}

pub(crate) fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

/// Places a scan on the visibility × accuracy grid. Visibility is share of
/// voice; accuracy is the mean of faithfulness and `100 − hallucination_risk`.
#[must_use]
pub fn quadrant(metrics: &MetricScores) -> Quadrant {
    let visibility = f64::from(metrics.share_of_voice);
    let accuracy =
        (f64::from(metrics.faithfulness) + f64::from(100 - metrics.hallucination_risk)) / 2.0;

    match (visibility >= VISIBILITY_THRESHOLD, accuracy >= ACCURACY_THRESHOLD) {
        (true, true) => Quadrant::Dominant,
        (true, false) => Quadrant::Vulnerable,
        (false, true) => Quadrant::Niche,
        (false, false) => Quadrant::Invisible,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn overall_score_weights_metrics() {
        let m = EvaluationMetrics {
            faithfulness_score: 80.0,
            share_of_voice: 40.0,
            sentiment: 0.5,
            voice_alignment_score: 60.0,
            hallucination_score: 90.0,
            ..EvaluationMetrics::default()
        };
        // 20 + 10 + 11.25 + 9 + 18
        assert_eq!(overall_score(&m), 68);
    }

    #[test]
    fn empty_scan_aggregates_to_zero() {
        let scores = aggregate(&[]);
        assert_eq!(scores, AggregatedScores::default());
        assert_eq!(scores.by_metric.hallucination_risk, 0);
    }

    #[test]
    fn aggregate_averages_and_groups() {
        let results = vec![
            result("chatgpt", "navigational", [80.0, 40.0, 0.5, 60.0, 90.0]),
            result("chatgpt", "adversarial", [60.0, 20.0, -0.5, 40.0, 70.0]),
            result("claude", "navigational", [100.0, 60.0, 0.0, 80.0, 100.0]),
        ];
        let scores = aggregate(&results);

        assert_eq!(scores.by_metric.faithfulness, 80);
        assert_eq!(scores.by_metric.share_of_voice, 40);
        assert_eq!(scores.by_metric.sentiment, 50);
        assert_eq!(scores.by_metric.voice_alignment, 60);
        assert_eq!(scores.by_metric.hallucination_risk, 13);
        // 20 + 10 + 7.5 + 9 + 17.33
        assert_eq!(scores.overall, 64);

        // per-result overall: 68, 44 (43.75), 80 (79.5)
        assert_eq!(results[1].overall(), 44);
        assert_eq!(results[2].overall(), 80);
        assert_eq!(scores.by_platform["chatgpt"], 56);
        assert_eq!(scores.by_platform["claude"], 80);
        assert_eq!(scores.by_category["navigational"], 74);
        assert_eq!(scores.by_category["adversarial"], 44);
    }

    #[test]
    fn overall_uses_unrounded_hallucination_mean() {
        let results = vec![
            result("chatgpt", "navigational", [3.8, 0.0, -1.0, 0.0, 7.0]),
            result("chatgpt", "navigational", [3.8, 0.0, -1.0, 0.0, 8.0]),
        ];
        let scores = aggregate(&results);

        // mean hallucination 7.5 rounds to 8 for the risk metric only
        assert_eq!(scores.by_metric.hallucination_risk, 92);
        // 0.95 + 1.5 = 2.45; the rounded mean would give 2.55
        assert_eq!(scores.overall, 2);
    }

    #[test]
    fn quadrant_boundaries() {
        let at = |sov, faith, risk| MetricScores {
            faithfulness: faith,
            share_of_voice: sov,
            hallucination_risk: risk,
            ..MetricScores::default()
        };
        assert_eq!(quadrant(&at(50, 70, 30)), Quadrant::Dominant);
        assert_eq!(quadrant(&at(50, 69, 30)), Quadrant::Vulnerable);
        assert_eq!(quadrant(&at(49, 90, 10)), Quadrant::Niche);
        assert_eq!(quadrant(&at(10, 40, 60)), Quadrant::Invisible);
    }

    #[test]
    fn simple_mean_normalises_sentiment() {
        let r = result("chatgpt", "voice", [50.0, 50.0, 0.0, 50.0, 50.0]);
        assert!((r.simple_mean() - 50.0).abs() < f64::EPSILON);
    }
}
