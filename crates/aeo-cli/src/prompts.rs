//! `prompts` sub-commands.

use aeo_perception::{generate_and_store, BrandKnowledge};
use aeo_prompts::{GeneratorOptions, DEFAULT_MAX_PER_CATEGORY};
use clap::Subcommand;

use crate::load_brand;

#[derive(Debug, Subcommand)]
pub enum PromptCommands {
    /// Generate and store prompts from the brand's profile
    Generate {
        /// Brand slug
        #[arg(long)]
        brand: String,

        /// Upper bound per category
        #[arg(long, default_value_t = DEFAULT_MAX_PER_CATEGORY)]
        max_per_category: usize,
    },
}

/// # Errors
///
/// Returns an error if the brand is unknown or a query fails.
pub(crate) async fn run_prompts(
    pool: &sqlx::PgPool,
    command: PromptCommands,
) -> anyhow::Result<()> {
    match command {
        PromptCommands::Generate {
            brand,
            max_per_category,
        } => run_generate(pool, &brand, max_per_category).await,
    }
}

async fn run_generate(
    pool: &sqlx::PgPool,
    slug: &str,
    max_per_category: usize,
) -> anyhow::Result<()> {
    let brand = load_brand(pool, slug).await?;
    let options = GeneratorOptions {
        max_per_category,
        review_sites: brand.review_sites.clone(),
        ..GeneratorOptions::default()
    };

    let knowledge = BrandKnowledge::load(pool, brand).await?;
    let result = generate_and_store(pool, &knowledge, &options).await?;

    println!("{:<20}COUNT", "CATEGORY");
    for row in &result.category_breakdown {
        println!("{:<20}{}", row.category.as_str(), row.count);
    }
    println!("{:<20}{}", "total", result.total);
    if !result.competitors_covered.is_empty() {
        println!("competitors: {}", result.competitors_covered.join(", "));
    }
    Ok(())
}
