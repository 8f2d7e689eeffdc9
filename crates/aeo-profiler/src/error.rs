use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfilerError {
    #[error("crawl error: {0}")]
    Crawler(#[from] aeo_crawler::CrawlerError),

    #[error("LLM error: {0}")]
    Llm(#[from] aeo_llm::LlmError),

    #[error("database error: {0}")]
    Db(#[from] aeo_db::DbError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("crawl of {0} produced no usable content")]
    EmptyContent(String),
}
