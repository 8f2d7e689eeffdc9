//! Vocabulary for perception scans: platforms, prompt categories, scan state.

text_enum! {
    /// AI chat platform a prompt is sent to.
    pub enum Platform as "platform" {
        Claude => "claude",
        ChatGpt => "chatgpt",
        Gemini => "gemini",
        Perplexity => "perplexity",
        GoogleAio => "google_aio",
    }
}

impl Platform {
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Platform::Claude => "Claude",
            Platform::ChatGpt => "ChatGPT",
            Platform::Gemini => "Gemini",
            Platform::Perplexity => "Perplexity",
            Platform::GoogleAio => "Google AI Overview",
        }
    }
}

text_enum! {
    pub enum PromptCategory as "prompt category" {
        Navigational => "navigational",
        Functional => "functional",
        Comparative => "comparative",
        Voice => "voice",
        Adversarial => "adversarial",
    }
}

impl PromptCategory {
    /// Short human label used in reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PromptCategory::Navigational => "The Who",
            PromptCategory::Functional => "The How",
            PromptCategory::Comparative => "The Which",
            PromptCategory::Voice => "The Vibe",
            PromptCategory::Adversarial => "The Risk",
        }
    }
}

text_enum! {
    pub enum PromptIntent as "prompt intent" {
        Informational => "informational",
        Commercial => "commercial",
        Transactional => "transactional",
        Navigational => "navigational",
    }
}

text_enum! {
    /// Lifecycle of a perception scan.
    pub enum ScanStatus as "scan status" {
        Pending => "pending",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
    }
}

impl ScanStatus {
    /// Whether a scan in `self` may move to `next`. A scan that never got
    /// started may still be failed.
    #[must_use]
    pub fn can_transition_to(self, next: ScanStatus) -> bool {
        matches!(
            (self, next),
            (ScanStatus::Pending, ScanStatus::Running | ScanStatus::Failed)
                | (ScanStatus::Running, ScanStatus::Completed | ScanStatus::Failed)
        )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ScanStatus::Completed | ScanStatus::Failed)
    }
}

text_enum! {
    /// Position on the visibility × accuracy grid.
    pub enum Quadrant as "quadrant" {
        Dominant => "dominant",
        Vulnerable => "vulnerable",
        Niche => "niche",
        Invisible => "invisible",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_round_trips_through_str() {
        for platform in Platform::ALL {
            let parsed: Platform = platform.as_str().parse().unwrap();
            assert_eq!(parsed, *platform);
        }
    }

    #[test]
    fn platform_rejects_unknown() {
        let err = "bing".parse::<Platform>().unwrap_err();
        assert_eq!(err.to_string(), "invalid platform: bing");
    }

    #[test]
    fn platform_serializes_snake_case() {
        let json = serde_json::to_string(&Platform::GoogleAio).unwrap();
        assert_eq!(json, "\"google_aio\"");
    }

    #[test]
    fn category_labels() {
        assert_eq!(PromptCategory::Navigational.label(), "The Who");
        assert_eq!(PromptCategory::Adversarial.label(), "The Risk");
    }

    #[test]
    fn scan_status_transitions() {
        assert!(ScanStatus::Pending.can_transition_to(ScanStatus::Running));
        assert!(ScanStatus::Running.can_transition_to(ScanStatus::Completed));
        assert!(ScanStatus::Running.can_transition_to(ScanStatus::Failed));
        assert!(ScanStatus::Pending.can_transition_to(ScanStatus::Failed));
        assert!(!ScanStatus::Pending.can_transition_to(ScanStatus::Completed));
        assert!(!ScanStatus::Completed.can_transition_to(ScanStatus::Running));
        assert!(!ScanStatus::Failed.can_transition_to(ScanStatus::Running));
    }

    #[test]
    fn terminal_statuses() {
        assert!(ScanStatus::Completed.is_terminal());
        assert!(ScanStatus::Failed.is_terminal());
        assert!(!ScanStatus::Running.is_terminal());
    }
}
