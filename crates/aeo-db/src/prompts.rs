//! Database operations for `perception_prompts`.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PromptRow {
    pub id: i64,
    pub brand_id: i64,
    pub template_id: String,
    pub category: String,
    pub intent: String,
    pub prompt_text: String,
    pub prompt_hash: String,
    pub priority: i32,
    pub expected_themes: Vec<String>,
    pub expected_citations: bool,
    pub adversarial_twist: Option<String>,
    pub is_hallucination_test: bool,
    pub target_persona: Option<String>,
    pub target_competitor: Option<String>,
    pub target_product: Option<String>,
    pub target_claim: Option<String>,
    pub expected_tone: Option<String>,
    pub expected_vocabulary: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPrompt {
    pub template_id: String,
    pub category: String,
    pub intent: String,
    pub prompt_text: String,
    pub priority: i32,
    pub expected_themes: Vec<String>,
    pub expected_citations: bool,
    pub adversarial_twist: Option<String>,
    pub is_hallucination_test: bool,
    pub target_persona: Option<String>,
    pub target_competitor: Option<String>,
    pub target_product: Option<String>,
    pub target_claim: Option<String>,
    pub expected_tone: Option<String>,
    pub expected_vocabulary: Option<String>,
}

const PROMPT_COLUMNS: &str = "id, brand_id, template_id, category, intent, prompt_text, \
     prompt_hash, priority, expected_themes, expected_citations, adversarial_twist, \
     is_hallucination_test, target_persona, target_competitor, target_product, target_claim, \
     expected_tone, expected_vocabulary, is_active, created_at, updated_at";

/// Dedup key for a rendered prompt: hex SHA-256 of the trimmed, lowercased text.
#[must_use]
pub fn prompt_hash(prompt_text: &str) -> String {
    let digest = Sha256::digest(prompt_text.trim().to_lowercase().as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Upserts generated prompts for a brand. A prompt whose text already exists
/// is reactivated and takes the new priority and metadata.
///
/// Returns the number of prompts written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the batch rolls back.
pub async fn upsert_prompts(
    pool: &PgPool,
    brand_id: i64,
    prompts: &[NewPrompt],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    for p in prompts {
        sqlx::query(
            "INSERT INTO perception_prompts (brand_id, template_id, category, intent, prompt_text, \
                 prompt_hash, priority, expected_themes, expected_citations, adversarial_twist, \
                 is_hallucination_test, target_persona, target_competitor, target_product, \
                 target_claim, expected_tone, expected_vocabulary) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17) \
             ON CONFLICT (brand_id, prompt_hash) DO UPDATE SET \
                 template_id = EXCLUDED.template_id, \
                 category = EXCLUDED.category, \
                 intent = EXCLUDED.intent, \
                 priority = EXCLUDED.priority, \
                 expected_themes = EXCLUDED.expected_themes, \
                 expected_citations = EXCLUDED.expected_citations, \
                 adversarial_twist = EXCLUDED.adversarial_twist, \
                 is_hallucination_test = EXCLUDED.is_hallucination_test, \
                 target_persona = EXCLUDED.target_persona, \
                 target_competitor = EXCLUDED.target_competitor, \
                 target_product = EXCLUDED.target_product, \
                 target_claim = EXCLUDED.target_claim, \
                 expected_tone = EXCLUDED.expected_tone, \
                 expected_vocabulary = EXCLUDED.expected_vocabulary, \
                 is_active = true, \
                 updated_at = NOW()",
        )
        .bind(brand_id)
        .bind(&p.template_id)
        .bind(&p.category)
        .bind(&p.intent)
        .bind(&p.prompt_text)
        .bind(prompt_hash(&p.prompt_text))
        .bind(p.priority)
        .bind(&p.expected_themes)
        .bind(p.expected_citations)
        .bind(&p.adversarial_twist)
        .bind(p.is_hallucination_test)
        .bind(&p.target_persona)
        .bind(&p.target_competitor)
        .bind(&p.target_product)
        .bind(&p.target_claim)
        .bind(&p.expected_tone)
        .bind(&p.expected_vocabulary)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(prompts.len())
}

/// Active prompts for a brand, highest priority first. `categories` narrows
/// the result when non-empty.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_active_prompts(
    pool: &PgPool,
    brand_id: i64,
    categories: &[String],
) -> Result<Vec<PromptRow>, DbError> {
    let rows = sqlx::query_as::<_, PromptRow>(&format!(
        "SELECT {PROMPT_COLUMNS} FROM perception_prompts \
         WHERE brand_id = $1 AND is_active = true \
           AND (cardinality($2::text[]) = 0 OR category = ANY($2)) \
         ORDER BY priority DESC, id"
    ))
    .bind(brand_id)
    .bind(categories)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_active_prompts(pool: &PgPool, brand_id: i64) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM perception_prompts WHERE brand_id = $1 AND is_active = true",
    )
    .bind(brand_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Soft-deletes a prompt so future scans skip it.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the prompt does not belong to the brand.
pub async fn deactivate_prompt(
    pool: &PgPool,
    brand_id: i64,
    prompt_id: i64,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE perception_prompts SET is_active = false, updated_at = NOW() \
         WHERE id = $1 AND brand_id = $2",
    )
    .bind(prompt_id)
    .bind(brand_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_hash_ignores_case_and_padding() {
        assert_eq!(prompt_hash("Acme vs Globex"), prompt_hash("  acme VS globex "));
        assert_ne!(prompt_hash("Acme vs Globex"), prompt_hash("Globex vs Acme"));
    }

    #[test]
    fn prompt_hash_is_hex_sha256() {
        let h = prompt_hash("hello");
        assert_eq!(h.len(), 64);
        assert_eq!(
            h,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
