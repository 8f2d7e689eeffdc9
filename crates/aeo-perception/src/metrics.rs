//! Per-response evaluation metrics and their lenient decoding from judge
//! output.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

const DEFAULT_FAITHFULNESS: f64 = 50.0;
const DEFAULT_SHARE_OF_VOICE: f64 = 0.0;
const DEFAULT_SENTIMENT: f64 = 0.0;
const DEFAULT_VOICE_ALIGNMENT: f64 = 50.0;
const DEFAULT_HALLUCINATION: f64 = 100.0;

static NULL: Value = Value::Null;

/// Scores for one platform response.
///
/// Percent-style scores are in `0..=100`; `sentiment` is in `-1..=1`.
/// A `hallucination_score` of 100 means nothing was invented.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    pub faithfulness_score: f64,
    pub faithfulness_errors: Vec<String>,
    pub share_of_voice: f64,
    pub brand_mentioned: bool,
    pub brand_position: Option<i32>,
    pub competitors_mentioned: Vec<String>,
    pub competitor_positions: BTreeMap<String, i32>,
    pub sentiment: f64,
    pub sentiment_label: String,
    pub aspect_sentiments: BTreeMap<String, f64>,
    pub voice_alignment_score: f64,
    pub voice_deviations: Vec<String>,
    pub hallucination_score: f64,
    pub hallucinations: Vec<String>,
    pub passed_trap_test: Option<bool>,
    pub key_themes: Vec<String>,
    pub missing_information: Vec<String>,
    pub opportunities: Vec<String>,
    pub summary: Option<String>,
}

impl Default for EvaluationMetrics {
    fn default() -> Self {
        Self::from_judge(&Value::Null)
    }
}

impl EvaluationMetrics {
    /// Decodes the judge's JSON. Missing sections take neutral defaults
    /// (faithfulness 50, share of voice 0, sentiment 0, voice 50,
    /// hallucination 100) and every score is clamped into range.
    #[must_use]
    pub fn from_judge(evaluation: &Value) -> Self {
        let section = |key: &str| evaluation.get(key).unwrap_or(&NULL);

        let faithfulness = section("faithfulness");
        let sov = section("shareOfVoice");
        let sentiment = section("sentiment");
        let voice = section("voiceAlignment");
        let hallucination = section("hallucination");

        let mentioned = sov.get("competitorsMentioned").unwrap_or(&NULL);
        let (competitors_mentioned, competitor_positions) = competitor_mentions(mentioned);

        let sentiment_score = number(sentiment, "overall")
            .unwrap_or(DEFAULT_SENTIMENT)
            .clamp(-1.0, 1.0);
        let label = sentiment
            .get("label")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map_or_else(|| sentiment_label(sentiment_score).to_string(), str::to_lowercase);

        let aspect_sentiments = sentiment
            .get("aspects")
            .and_then(Value::as_object)
            .map(|aspects| {
                aspects
                    .iter()
                    .filter_map(|(k, v)| v.as_f64().map(|n| (k.clone(), n.clamp(-1.0, 1.0))))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            faithfulness_score: percent(faithfulness, "score", DEFAULT_FAITHFULNESS),
            faithfulness_errors: text_list(faithfulness.get("errors")),
            share_of_voice: percent(sov, "score", DEFAULT_SHARE_OF_VOICE),
            brand_mentioned: sov
                .get("brandMentioned")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            brand_position: number(sov, "brandPosition")
                .filter(|p| *p >= 1.0)
                .map(round_to_i32),
            competitors_mentioned,
            competitor_positions,
            sentiment: sentiment_score,
            sentiment_label: label,
            aspect_sentiments,
            voice_alignment_score: percent(voice, "score", DEFAULT_VOICE_ALIGNMENT),
            voice_deviations: text_list(voice.get("deviations")),
            hallucination_score: percent(hallucination, "score", DEFAULT_HALLUCINATION),
            hallucinations: text_list(hallucination.get("detected")),
            passed_trap_test: hallucination.get("passedTrapTest").and_then(Value::as_bool),
            key_themes: text_list(evaluation.get("keyThemes")),
            missing_information: text_list(evaluation.get("missingInformation")),
            opportunities: text_list(evaluation.get("opportunities")),
            summary: evaluation
                .get("summary")
                .and_then(Value::as_str)
                .map(str::to_string)
                .filter(|s| !s.trim().is_empty()),
        }
    }

    #[must_use]
    pub fn hallucination_detected(&self) -> bool {
        !self.hallucinations.is_empty()
    }
}

/// Bucket label for a `-1..=1` sentiment score.
#[must_use]
pub fn sentiment_label(score: f64) -> &'static str {
    if score <= -0.6 {
        "very_negative"
    } else if score < -0.2 {
        "negative"
    } else if score <= 0.2 {
        "neutral"
    } else if score < 0.6 {
        "positive"
    } else {
        "very_positive"
    }
}

pub(crate) fn round_to_i32(value: f64) -> i32 {
    #[allow(clippy::cast_possible_truncation)]
    let rounded = value.round() as i32;
    rounded
}

fn number(section: &Value, key: &str) -> Option<f64> {
    let value = section.get(key)?;
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|n: &f64| n.is_finite())
}

fn percent(section: &Value, key: &str, default: f64) -> f64 {
    number(section, key).unwrap_or(default).clamp(0.0, 100.0)
}

/// Strings pass through; objects and other values are kept as compact JSON.
fn text_list(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter(|v| !v.is_null())
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .filter(|s| !s.trim().is_empty())
        .collect()
}

/// Competitor names in mention order. Bare strings take their index + 1 as
/// position; `{name, position}` objects keep the explicit position.
fn competitor_mentions(value: &Value) -> (Vec<String>, BTreeMap<String, i32>) {
    let mut names = Vec::new();
    let mut positions = BTreeMap::new();
    let Value::Array(items) = value else {
        return (names, positions);
    };

    for (index, item) in items.iter().enumerate() {
        match item {
            Value::String(name) if !name.trim().is_empty() => {
                let position = i32::try_from(index + 1).unwrap_or(i32::MAX);
                positions.entry(name.clone()).or_insert(position);
                names.push(name.clone());
            }
            Value::Object(obj) => {
                let Some(name) = obj
                    .get("name")
                    .and_then(Value::as_str)
                    .filter(|n| !n.trim().is_empty())
                else {
                    continue;
                };
                if let Some(position) = number(item, "position").filter(|p| *p >= 1.0) {
                    positions.insert(name.to_string(), round_to_i32(position));
                }
                names.push(name.to_string());
            }
            _ => {}
        }
    }
    (names, positions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_evaluation_uses_neutral_defaults() {
        let m = EvaluationMetrics::from_judge(&json!({}));
        assert!((m.faithfulness_score - 50.0).abs() < f64::EPSILON);
        assert!(m.share_of_voice.abs() < f64::EPSILON);
        assert!(m.sentiment.abs() < f64::EPSILON);
        assert!((m.voice_alignment_score - 50.0).abs() < f64::EPSILON);
        assert!((m.hallucination_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(m.sentiment_label, "neutral");
        assert!(!m.brand_mentioned);
        assert!(!m.hallucination_detected());
    }

    #[test]
    fn explicit_zero_is_kept() {
        let m = EvaluationMetrics::from_judge(&json!({"faithfulness": {"score": 0}}));
        assert!(m.faithfulness_score.abs() < f64::EPSILON);
    }

    #[test]
    fn scores_are_clamped() {
        let m = EvaluationMetrics::from_judge(&json!({
            "faithfulness": {"score": 140},
            "shareOfVoice": {"score": -5},
            "sentiment": {"overall": 3.5},
            "hallucination": {"score": "250"}
        }));
        assert!((m.faithfulness_score - 100.0).abs() < f64::EPSILON);
        assert!(m.share_of_voice.abs() < f64::EPSILON);
        assert!((m.sentiment - 1.0).abs() < f64::EPSILON);
        assert!((m.hallucination_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(m.sentiment_label, "very_positive");
    }

    #[test]
    fn error_lists_accept_objects() {
        let m = EvaluationMetrics::from_judge(&json!({
            "faithfulness": {"errors": ["wrong year", {"claim": "founded 1990", "severity": "major"}]},
            "hallucination": {"detected": [{"claim": "won an award"}], "score": 40}
        }));
        assert_eq!(m.faithfulness_errors.len(), 2);
        assert_eq!(m.faithfulness_errors[0], "wrong year");
        assert!(m.faithfulness_errors[1].contains("\"claim\":\"founded 1990\""));
        assert!(m.hallucination_detected());
    }

    #[test]
    fn competitor_positions_from_strings_and_objects() {
        let m = EvaluationMetrics::from_judge(&json!({
            "shareOfVoice": {
                "score": 35,
                "brandMentioned": true,
                "brandPosition": 2,
                "competitorsMentioned": [
                    "Tableau",
                    {"name": "Looker", "position": 4},
                    {"position": 5},
                    ""
                ]
            }
        }));
        assert_eq!(m.competitors_mentioned, vec!["Tableau", "Looker"]);
        assert_eq!(m.competitor_positions.get("Tableau"), Some(&1));
        assert_eq!(m.competitor_positions.get("Looker"), Some(&4));
        assert_eq!(m.brand_position, Some(2));
    }

    #[test]
    fn brand_position_zero_is_absent() {
        let m = EvaluationMetrics::from_judge(&json!({"shareOfVoice": {"brandPosition": 0}}));
        assert_eq!(m.brand_position, None);
    }

    #[test]
    fn sentiment_label_prefers_judge_label() {
        let m = EvaluationMetrics::from_judge(&json!({
            "sentiment": {"overall": -0.4, "label": "Negative", "aspects": {"pricing": -2, "support": "x"}}
        }));
        assert_eq!(m.sentiment_label, "negative");
        assert_eq!(m.aspect_sentiments.len(), 1);
        assert!((m.aspect_sentiments["pricing"] + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn sentiment_buckets() {
        assert_eq!(sentiment_label(-0.9), "very_negative");
        assert_eq!(sentiment_label(-0.3), "negative");
        assert_eq!(sentiment_label(0.0), "neutral");
        assert_eq!(sentiment_label(0.4), "positive");
        assert_eq!(sentiment_label(0.8), "very_positive");
    }
}
