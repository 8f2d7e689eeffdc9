//! Database operations for `perception_results`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A stored, evaluated platform response.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResultRow {
    pub id: i64,
    pub scan_id: i64,
    pub prompt_id: i64,
    pub platform: String,
    pub response: String,
    pub model: String,
    pub response_time_ms: i32,
    pub faithfulness_score: f64,
    pub share_of_voice: f64,
    pub brand_mentioned: bool,
    pub brand_position: Option<i32>,
    pub competitors_mentioned: serde_json::Value,
    pub sentiment_score: f64,
    pub sentiment_label: String,
    pub voice_alignment_score: f64,
    pub hallucination_score: f64,
    pub hallucination_detected: bool,
    pub overall_score: i32,
    pub evaluation: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A result joined with the prompt it answered; the shape aggregation and
/// comparison work from.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScoredResultRow {
    pub id: i64,
    pub prompt_id: i64,
    pub platform: String,
    pub category: String,
    pub template_id: String,
    pub prompt_text: String,
    pub response: String,
    pub model: String,
    pub faithfulness_score: f64,
    pub share_of_voice: f64,
    pub brand_mentioned: bool,
    pub brand_position: Option<i32>,
    pub competitors_mentioned: serde_json::Value,
    pub sentiment_score: f64,
    pub sentiment_label: String,
    pub voice_alignment_score: f64,
    pub hallucination_score: f64,
    pub hallucination_detected: bool,
    pub overall_score: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewResult {
    pub scan_id: i64,
    pub prompt_id: i64,
    pub platform: String,
    pub response: String,
    pub model: String,
    pub response_time_ms: i32,
    pub faithfulness_score: f64,
    pub share_of_voice: f64,
    pub brand_mentioned: bool,
    pub brand_position: Option<i32>,
    pub competitors_mentioned: serde_json::Value,
    pub sentiment_score: f64,
    pub sentiment_label: String,
    pub voice_alignment_score: f64,
    pub hallucination_score: f64,
    pub hallucination_detected: bool,
    pub overall_score: i32,
    pub evaluation: serde_json::Value,
}

/// Inserts one evaluated response. Re-running the same prompt on the same
/// platform within a scan overwrites the earlier answer.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_result(pool: &PgPool, result: &NewResult) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO perception_results (scan_id, prompt_id, platform, response, model, \
             response_time_ms, faithfulness_score, share_of_voice, brand_mentioned, \
             brand_position, \
             competitors_mentioned, sentiment_score, sentiment_label, voice_alignment_score, \
             hallucination_score, hallucination_detected, overall_score, evaluation) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
         ON CONFLICT (scan_id, prompt_id, platform) DO UPDATE SET \
             response = EXCLUDED.response, \
             model = EXCLUDED.model, \
             response_time_ms = EXCLUDED.response_time_ms, \
             faithfulness_score = EXCLUDED.faithfulness_score, \
             share_of_voice = EXCLUDED.share_of_voice, \
             brand_mentioned = EXCLUDED.brand_mentioned, \
             brand_position = EXCLUDED.brand_position, \
             competitors_mentioned = EXCLUDED.competitors_mentioned, \
             sentiment_score = EXCLUDED.sentiment_score, \
             sentiment_label = EXCLUDED.sentiment_label, \
             voice_alignment_score = EXCLUDED.voice_alignment_score, \
             hallucination_score = EXCLUDED.hallucination_score, \
             hallucination_detected = EXCLUDED.hallucination_detected, \
             overall_score = EXCLUDED.overall_score, \
             evaluation = EXCLUDED.evaluation \
         RETURNING id",
    )
    .bind(result.scan_id)
    .bind(result.prompt_id)
    .bind(&result.platform)
    .bind(&result.response)
    .bind(&result.model)
    .bind(result.response_time_ms)
    .bind(result.faithfulness_score)
    .bind(result.share_of_voice)
    .bind(result.brand_mentioned)
    .bind(result.brand_position)
    .bind(&result.competitors_mentioned)
    .bind(result.sentiment_score)
    .bind(&result.sentiment_label)
    .bind(result.voice_alignment_score)
    .bind(result.hallucination_score)
    .bind(result.hallucination_detected)
    .bind(result.overall_score)
    .bind(&result.evaluation)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// All results of a scan with their prompt category, in insertion order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_results_for_scan(
    pool: &PgPool,
    scan_id: i64,
) -> Result<Vec<ScoredResultRow>, DbError> {
    let rows = sqlx::query_as::<_, ScoredResultRow>(
        "SELECT r.id, r.prompt_id, r.platform, p.category, p.template_id, p.prompt_text, \
                r.response, r.model, r.faithfulness_score, r.share_of_voice, r.brand_mentioned, \
                r.brand_position, r.competitors_mentioned, r.sentiment_score, r.sentiment_label, \
                r.voice_alignment_score, r.hallucination_score, r.hallucination_detected, \
                r.overall_score, r.created_at \
         FROM perception_results r \
         JOIN perception_prompts p ON p.id = r.prompt_id \
         WHERE r.scan_id = $1 \
         ORDER BY r.id",
    )
    .bind(scan_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
