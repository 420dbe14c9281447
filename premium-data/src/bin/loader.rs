use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use premium_data::BracketLoader;
use premium_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Load insurance bracket data from a CSV file into the database.
///
/// The CSV file should have the following columns:
/// - category: labor, health, labor_pension or occupational_injury
/// - grade_level: tier number within the category
/// - salary_min / salary_max: inclusive salary range (max empty for the top tier)
/// - premium_base: assessed wage the premium is computed from
/// - rate: premium rate as a decimal (e.g., 0.125)
/// - employee_ratio / employer_ratio / government_ratio: payer shares
/// - effective_date / expiry_date: validity window (expiry may be empty)
#[derive(Parser, Debug)]
#[command(name = "premium-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing bracket data
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database URL (e.g., sqlite:insurance.db?mode=rwc to create if missing)
    #[arg(short, long, default_value = "sqlite:insurance.db?mode=rwc")]
    database: String,

    /// Run database migrations before loading data
    #[arg(short, long, default_value_t = false)]
    migrate: bool,

    /// Run seed files from the specified directory after migrations
    #[arg(short, long)]
    seeds: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let repo = SqliteRepository::new(&args.database)
        .await
        .with_context(|| format!("Failed to connect to database: {}", args.database))?;

    if args.migrate {
        println!("Running migrations...");
        repo.run_migrations()
            .await
            .context("Failed to run migrations")?;
        println!("Migrations complete.");
    }

    if let Some(seeds_dir) = &args.seeds {
        println!("Running seeds from: {}", seeds_dir.display());
        repo.run_seeds(seeds_dir)
            .await
            .with_context(|| format!("Failed to run seeds from: {}", seeds_dir.display()))?;
        println!("Seeds complete.");
    }

    println!("Loading insurance brackets from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = BracketLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let inserted = BracketLoader::load(&repo, &records)
        .await
        .context("Failed to load insurance brackets into database")?;

    println!(
        "Successfully loaded {} insurance brackets into the database.",
        inserted
    );

    Ok(())
}
