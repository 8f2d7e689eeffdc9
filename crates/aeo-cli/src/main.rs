mod analyze;
mod prompts;
mod report;
mod scan;

use aeo_core::Platform;
use aeo_perception::DateRange;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::prompts::PromptCommands;

#[derive(Debug, Parser)]
#[command(name = "aeo-cli")]
#[command(about = "AI engine perception command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Crawl a brand's site and extract its profile
    Analyze {
        /// Brand slug
        #[arg(long)]
        brand: String,

        /// Start URL; defaults to `https://{domain}`
        #[arg(long)]
        url: Option<String>,
    },
    /// Prompt library management
    Prompts {
        #[command(subcommand)]
        command: PromptCommands,
    },
    /// Run a perception scan for a brand
    Scan {
        /// Brand slug
        #[arg(long)]
        brand: String,

        /// Platform to query; repeat for several (default: chatgpt)
        #[arg(long = "platform", value_parser = parse_platform)]
        platforms: Vec<Platform>,

        /// Cap on prompts, balanced across categories
        #[arg(long)]
        max_prompts: Option<usize>,

        /// Print the scan plan without querying or writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the summary report for a brand
    Report {
        /// Brand slug
        #[arg(long)]
        brand: String,

        /// Window: 7d, 30d, 90d or all
        #[arg(long, default_value = "30d", value_parser = parse_range)]
        range: DateRange,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
    /// Upsert brands from the brands file
    Seed,
}

fn parse_platform(raw: &str) -> Result<Platform, String> {
    raw.parse().map_err(|e| format!("{e}"))
}

fn parse_range(raw: &str) -> Result<DateRange, String> {
    raw.parse()
        .map_err(|_| format!("invalid range '{raw}'; expected 7d, 30d, 90d or all"))
}

/// Looks up one brand by slug.
///
/// # Errors
///
/// Returns an error if the slug is unknown or the query fails.
pub(crate) async fn load_brand(
    pool: &sqlx::PgPool,
    slug: &str,
) -> anyhow::Result<aeo_db::BrandRow> {
    aeo_db::get_brand_by_slug(pool, slug)
        .await?
        .ok_or_else(|| anyhow::anyhow!("brand '{slug}' not found; run `aeo-cli db seed` first"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("aeo-cli: no command given; see --help");
        return Ok(());
    };

    let config = aeo_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = aeo_db::PoolConfig::from_app_config(&config);
    let pool = aeo_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => run_db(&pool, &config, command).await?,
        Commands::Analyze { brand, url } => {
            analyze::run_analyze(&pool, &config, &brand, url.as_deref()).await?;
        }
        Commands::Prompts { command } => prompts::run_prompts(&pool, command).await?,
        Commands::Scan {
            brand,
            platforms,
            max_prompts,
            dry_run,
        } => {
            let plan = scan::ScanPlan {
                platforms,
                max_prompts,
            };
            if dry_run {
                scan::run_scan_dry_run(&pool, &brand, &plan).await?;
            } else {
                scan::run_scan(&pool, &config, &brand, &plan).await?;
            }
        }
        Commands::Report { brand, range } => report::run_report(&pool, &brand, range).await?,
    }

    Ok(())
}

async fn run_db(
    pool: &sqlx::PgPool,
    config: &aeo_core::AppConfig,
    command: DbCommands,
) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            aeo_db::ping(pool).await?;
            println!("database reachable");
        }
        DbCommands::Migrate => {
            let applied = aeo_db::run_migrations(pool).await?;
            println!("migrations up to date ({applied} applied)");
        }
        DbCommands::Seed => {
            let file = aeo_core::load_brands(&config.brands_path)?;
            let count = aeo_db::seed_brands(pool, &file.brands).await?;
            println!(
                "seeded {count} brands from {}",
                config.brands_path.display()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
