//! Perception scanning for AEO.
//!
//! Queries AI platforms with a brand's prompts, judges each answer against the
//! brand's ground truth, and rolls the judgements up into scores, a quadrant,
//! and prioritized insights. Also drafts correction plans for insights and
//! builds scan comparisons and summary reports.

pub mod compare;
pub mod corrections;
pub mod error;
pub mod evaluator;
pub mod ground_truth;
pub mod insights;
pub mod metrics;
pub mod orchestrator;
pub mod platforms;
pub mod prompts;
pub mod report;
pub mod scoring;

pub use compare::{compare_for_brand, compare_scans, ScanComparison, ScanSnapshot};
pub use corrections::{CorrectionGenerator, CorrectionPlan, CorrectionSuggestion, InsightBrief};
pub use error::PerceptionError;
pub use evaluator::{Evaluation, Evaluator, PromptContext};
pub use ground_truth::{BrandKnowledge, GroundTruth};
pub use insights::{generate_insights, Insight};
pub use metrics::EvaluationMetrics;
pub use orchestrator::{PreparedScan, ScanOptions, ScanOrchestrator, ScanOutcome};
pub use platforms::{PlatformQuerier, QueryResult};
pub use prompts::generate_and_store;
pub use report::{build_summary, load_summary, DateRange, SummaryReport};
pub use scoring::{aggregate, quadrant, AggregatedScores, MetricScores, ResultScores};
