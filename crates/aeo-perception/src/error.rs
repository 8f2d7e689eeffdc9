use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum PerceptionError {
    #[error("LLM error: {0}")]
    Llm(#[from] aeo_llm::LlmError),

    #[error("database error: {0}")]
    Db(#[from] aeo_db::DbError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no active prompts for brand {0}, and none could be generated")]
    NoPrompts(String),

    #[error("no platforms selected")]
    NoPlatforms,

    #[error("all {0} evaluations failed")]
    AllEvaluationsFailed(usize),

    #[error("scan not found: {0}")]
    ScanNotFound(Uuid),

    #[error("need at least 2 completed scans to compare, found {0}")]
    NotEnoughScans(usize),

    #[error("scans must be from the same brand")]
    ScanBrandMismatch,

    #[error("stored value is invalid: {0}")]
    InvalidStoredValue(String),
}
