//! Turns aggregated scan scores into prioritised, actionable insights.

use std::collections::{BTreeMap, BTreeSet};

use aeo_core::{Effort, InsightCategory, InsightPriority, PromptCategory};
use aeo_db::NewInsight;
use serde::Serialize;

use crate::metrics::round_to_i32;
use crate::scoring::{AggregatedScores, ResultScores};

const LOW_VISIBILITY: i32 = 30;
const LOW_FAITHFULNESS: i32 = 60;
const HIGH_HALLUCINATION_RISK: i32 = 20;
const LOW_SENTIMENT: i32 = 40;
const LOW_VOICE_ALIGNMENT: i32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub category: InsightCategory,
    pub priority: InsightPriority,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub recommendation: String,
    pub effort: Effort,
    pub current_value: f64,
    pub target_value: f64,
    pub affected_platforms: Vec<String>,
    pub affected_categories: Vec<String>,
}

impl Insight {
    #[must_use]
    pub fn to_new_insight(&self) -> NewInsight {
        NewInsight {
            category: self.category.to_string(),
            priority: self.priority.to_string(),
            title: self.title.clone(),
            description: self.description.clone(),
            impact: self.impact.clone(),
            recommendation: self.recommendation.clone(),
            current_value: Some(self.current_value),
            target_value: Some(self.target_value),
            effort: self.effort.to_string(),
            affected_platforms: self.affected_platforms.clone(),
            affected_categories: self.affected_categories.clone(),
        }
    }
}

/// Builds the insights a scan warrants.
///
/// Each rule names the prompt categories it concerns; only those that were
/// actually part of the scan are reported, falling back to the full list
/// when none of them were.
#[must_use]
pub fn generate_insights(
    scores: &AggregatedScores,
    results: &[ResultScores],
    brand_name: &str,
) -> Vec<Insight> {
    let m = &scores.by_metric;
    let platforms: Vec<String> = scores.by_platform.keys().cloned().collect();
    let scanned: BTreeSet<&str> = results.iter().map(|r| r.category.as_str()).collect();

    let make = |category,
                priority,
                title: String,
                description: String,
                impact: &str,
                recommendation: &str,
                effort,
                current: i32,
                target: i32,
                concerns: &[PromptCategory]| Insight {
        category,
        priority,
        title,
        description,
        impact: impact.to_string(),
        recommendation: recommendation.to_string(),
        effort,
        current_value: f64::from(current),
        target_value: f64::from(target),
        affected_platforms: platforms.clone(),
        affected_categories: affected_categories(concerns, &scanned),
    };

    let mut insights = Vec::new();

    if m.share_of_voice < LOW_VISIBILITY {
        insights.push(make(
            InsightCategory::Visibility,
            InsightPriority::Critical,
            "Low AI Visibility".to_string(),
            format!(
                "{brand_name} is mentioned in only {}% of AI responses. The brand is largely \
                 invisible to AI assistants.",
                m.share_of_voice
            ),
            "Users asking AI assistants about your category rarely hear about you.",
            "Improve your Schema.org markup, build more backlinks from authoritative sources, \
             and ensure your Wikipedia presence is accurate.",
            Effort::High,
            m.share_of_voice,
            50,
            &[
                PromptCategory::Navigational,
                PromptCategory::Functional,
                PromptCategory::Comparative,
            ],
        ));
    }

    if m.faithfulness < LOW_FAITHFULNESS {
        insights.push(make(
            InsightCategory::Accuracy,
            InsightPriority::High,
            "Factual Inaccuracies Detected".to_string(),
            format!(
                "AI responses about {brand_name} have a {}% error rate.",
                100 - m.faithfulness
            ),
            "Users are receiving incorrect information about your products and services.",
            "Update your website content to be clearer, add FAQ pages addressing common \
             questions, and ensure your Google Knowledge Panel is accurate.",
            Effort::Medium,
            m.faithfulness,
            80,
            &[PromptCategory::Navigational, PromptCategory::Functional],
        ));
    }

    if m.hallucination_risk > HIGH_HALLUCINATION_RISK {
        insights.push(make(
            InsightCategory::Hallucination,
            InsightPriority::Critical,
            "Hallucination Risk Detected".to_string(),
            format!(
                "AI models are inventing facts about {brand_name} {}% of the time.",
                m.hallucination_risk
            ),
            "Users may receive fabricated information about features, pricing, or awards you \
             don't have.",
            "Create authoritative content that explicitly states what you do and don't offer. \
             Add structured data to your pages.",
            Effort::Medium,
            m.hallucination_risk,
            5,
            &[PromptCategory::Adversarial],
        ));
    }

    if m.sentiment < LOW_SENTIMENT {
        insights.push(make(
            InsightCategory::Sentiment,
            InsightPriority::High,
            "Negative Sentiment in AI Responses".to_string(),
            format!(
                "AI assistants describe {brand_name} with {}% negative sentiment.",
                100 - m.sentiment
            ),
            "Users are being discouraged from choosing your brand.",
            "Address negative reviews publicly, create positive case studies, and build more \
             positive content signals.",
            Effort::High,
            m.sentiment,
            70,
            &[PromptCategory::Voice, PromptCategory::Adversarial],
        ));
    }

    if m.voice_alignment < LOW_VOICE_ALIGNMENT {
        insights.push(make(
            InsightCategory::Voice,
            InsightPriority::Medium,
            "Brand Voice Misalignment".to_string(),
            format!(
                "AI descriptions of {brand_name} don't match the intended voice and personality."
            ),
            "Your brand is being represented inconsistently across AI platforms.",
            "Ensure your website and public content consistently uses your brand voice. Update \
             your About page to clearly express your brand personality.",
            Effort::Low,
            m.voice_alignment,
            75,
            &[PromptCategory::Voice],
        ));
    }

    if let Some((competitor, share)) = dominant_competitor(results) {
        insights.push(make(
            InsightCategory::Competitive,
            InsightPriority::Medium,
            format!("Competitor Dominance: {competitor}"),
            format!(
                "{competitor} is mentioned in {share}% of responses where {brand_name} should be \
                 featured."
            ),
            "Your competitor is capturing share of voice that could be yours.",
            "Create comparison content, highlight your differentiators, and ensure your unique \
             value propositions are well-documented.",
            Effort::Medium,
            share,
            25,
            &[PromptCategory::Comparative],
        ));
    }

    insights
}

fn affected_categories(concerns: &[PromptCategory], scanned: &BTreeSet<&str>) -> Vec<String> {
    let present: Vec<String> = concerns
        .iter()
        .filter(|c| scanned.contains(c.as_str()))
        .map(ToString::to_string)
        .collect();
    if present.is_empty() {
        concerns.iter().map(ToString::to_string).collect()
    } else {
        present
    }
}

/// The competitor named in more than half of all results, with its share of
/// results as a rounded percentage. Ties go to the alphabetically first name.
fn dominant_competitor(results: &[ResultScores]) -> Option<(String, i32)> {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for result in results {
        let distinct: BTreeSet<&str> = result
            .competitors_mentioned
            .iter()
            .map(String::as_str)
            .collect();
        for name in distinct {
            *counts.entry(name).or_default() += 1;
        }
    }

    let (name, count) = counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))?;

    let total = u32::try_from(results.len()).unwrap_or(u32::MAX);
    if count * 2 <= total {
        return None;
    }
    let share = round_to_i32(f64::from(count) / f64::from(total) * 100.0);
    Some((name.to_string(), share))
}
