//! Insight and correction-workflow vocabulary, plus the audience and
//! competitor weightings used when generating prompts.

text_enum! {
    pub enum InsightCategory as "insight category" {
        Visibility => "visibility",
        Accuracy => "accuracy",
        Hallucination => "hallucination",
        Sentiment => "sentiment",
        Voice => "voice",
        Competitive => "competitive",
        MissingInfo => "missing_info",
        CompetitorConfusion => "competitor_confusion",
    }
}

text_enum! {
    pub enum InsightPriority as "insight priority" {
        Critical => "critical",
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

impl InsightPriority {
    /// Sort rank, lower is more urgent.
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            InsightPriority::Critical => 0,
            InsightPriority::High => 1,
            InsightPriority::Medium => 2,
            InsightPriority::Low => 3,
        }
    }
}

text_enum! {
    pub enum InsightStatus as "insight status" {
        Open => "open",
        InProgress => "in_progress",
        Resolved => "resolved",
        Dismissed => "dismissed",
    }
}

text_enum! {
    pub enum Effort as "effort" {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

text_enum! {
    pub enum ProblemType as "problem type" {
        Hallucination => "hallucination",
        MissingInfo => "missing_info",
        WrongSentiment => "wrong_sentiment",
        CompetitorConfusion => "competitor_confusion",
    }
}

impl ProblemType {
    #[must_use]
    pub fn for_insight(category: InsightCategory) -> Self {
        match category {
            InsightCategory::Hallucination => ProblemType::Hallucination,
            InsightCategory::Accuracy
            | InsightCategory::MissingInfo
            | InsightCategory::Visibility => ProblemType::MissingInfo,
            InsightCategory::Sentiment | InsightCategory::Voice => ProblemType::WrongSentiment,
            InsightCategory::Competitive | InsightCategory::CompetitorConfusion => {
                ProblemType::CompetitorConfusion
            }
        }
    }

    /// Default workflow priority for a correction addressing this problem.
    #[must_use]
    pub fn priority(self) -> InsightPriority {
        match self {
            ProblemType::Hallucination | ProblemType::CompetitorConfusion => InsightPriority::High,
            ProblemType::WrongSentiment | ProblemType::MissingInfo => InsightPriority::Medium,
        }
    }
}

text_enum! {
    pub enum FixType as "fix type" {
        SchemaOrg => "schema_org",
        Faq => "faq",
        Content => "content",
        Wikipedia => "wikipedia",
    }
}

impl FixType {
    #[must_use]
    pub fn effort(self) -> Effort {
        match self {
            FixType::SchemaOrg | FixType::Faq => Effort::Low,
            FixType::Content => Effort::Medium,
            FixType::Wikipedia => Effort::High,
        }
    }
}

text_enum! {
    pub enum CorrectionStatus as "correction status" {
        Suggested => "suggested",
        Approved => "approved",
        Implemented => "implemented",
        Verified => "verified",
        Dismissed => "dismissed",
    }
}

impl CorrectionStatus {
    #[must_use]
    pub fn can_transition_to(self, next: CorrectionStatus) -> bool {
        use CorrectionStatus::{Approved, Dismissed, Implemented, Suggested, Verified};
        matches!(
            (self, next),
            (Suggested, Approved)
                | (Approved, Implemented)
                | (Approved | Implemented, Verified)
                | (Suggested | Approved | Implemented, Dismissed)
        )
    }
}

text_enum! {
    pub enum PersonaType as "persona type" {
        Primary => "primary",
        Secondary => "secondary",
        Tertiary => "tertiary",
        Anti => "anti",
    }
}

impl PersonaType {
    /// Priority multiplier applied to prompts generated for this persona.
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            PersonaType::Primary => 1.5,
            PersonaType::Secondary => 1.0,
            PersonaType::Tertiary => 0.7,
            PersonaType::Anti => 0.5,
        }
    }
}

text_enum! {
    pub enum ThreatLevel as "threat level" {
        Critical => "critical",
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

impl ThreatLevel {
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            ThreatLevel::Critical => 1.5,
            ThreatLevel::High => 1.3,
            ThreatLevel::Medium => 1.0,
            ThreatLevel::Low => 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_type_mapping() {
        assert_eq!(
            ProblemType::for_insight(InsightCategory::Hallucination),
            ProblemType::Hallucination
        );
        assert_eq!(
            ProblemType::for_insight(InsightCategory::Visibility),
            ProblemType::MissingInfo
        );
        assert_eq!(
            ProblemType::for_insight(InsightCategory::Voice),
            ProblemType::WrongSentiment
        );
        assert_eq!(
            ProblemType::for_insight(InsightCategory::Competitive),
            ProblemType::CompetitorConfusion
        );
    }

    #[test]
    fn problem_priority() {
        assert_eq!(ProblemType::Hallucination.priority(), InsightPriority::High);
        assert_eq!(ProblemType::MissingInfo.priority(), InsightPriority::Medium);
    }

    #[test]
    fn fix_effort() {
        assert_eq!(FixType::SchemaOrg.effort(), Effort::Low);
        assert_eq!(FixType::Faq.effort(), Effort::Low);
        assert_eq!(FixType::Content.effort(), Effort::Medium);
        assert_eq!(FixType::Wikipedia.effort(), Effort::High);
    }

    #[test]
    fn correction_transitions() {
        use CorrectionStatus::*;
        assert!(Suggested.can_transition_to(Approved));
        assert!(!Suggested.can_transition_to(Implemented));
        assert!(!Suggested.can_transition_to(Verified));
        assert!(Approved.can_transition_to(Implemented));
        assert!(Approved.can_transition_to(Verified));
        assert!(Implemented.can_transition_to(Verified));
        assert!(Implemented.can_transition_to(Dismissed));
        assert!(!Verified.can_transition_to(Dismissed));
        assert!(!Dismissed.can_transition_to(Approved));
    }

    #[test]
    fn multipliers() {
        assert!((PersonaType::Primary.multiplier() - 1.5).abs() < f64::EPSILON);
        assert!((PersonaType::Anti.multiplier() - 0.5).abs() < f64::EPSILON);
        assert!((ThreatLevel::High.multiplier() - 1.3).abs() < f64::EPSILON);
        assert!((ThreatLevel::Low.multiplier() - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn priority_rank_orders_by_urgency() {
        let mut all = InsightPriority::ALL.to_vec();
        all.reverse();
        all.sort_by_key(|p| p.rank());
        assert_eq!(all[0], InsightPriority::Critical);
        assert_eq!(all[3], InsightPriority::Low);
    }
}
