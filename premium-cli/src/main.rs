use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::debug;

use premium_cli::{app, logging};
use premium_core::db::{BracketRepository, DbConfig};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Taiwanese social insurance premium calculator.
///
/// Connects to the configured database (seeding the reference bracket
/// tables on first use), resolves brackets, and prints premium splits.
#[derive(Debug, Parser)]
#[command(name = "premium", version)]
struct Cli {
    /// Database backend to use.
    #[arg(long, global = true, default_value = "sqlite")]
    backend: String,

    /// Database connection string.
    /// For SQLite this is a file path (e.g. `insurance.db`) or `:memory:`.
    #[arg(long, global = true, default_value = "insurance.db")]
    db: String,

    /// Log filter directive (e.g. `debug`, `premium_core=trace`).
    /// Overrides `RUST_LOG`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log records to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compute the premium split for a monthly salary.
    Quote {
        /// labor, health, labor_pension or occupational_injury
        #[arg(long)]
        category: String,

        /// Monthly salary, e.g. 28590
        #[arg(long)]
        salary: String,

        /// Evaluate validity windows on this date instead of today.
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// List the brackets of a category that are active on a date.
    Brackets {
        #[arg(long)]
        category: String,

        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Validate an 8-digit business registration number.
    CheckTaxId {
        /// The number exactly as written; whitespace is not trimmed.
        id: String,
    },
}

async fn open_repository(config: &DbConfig) -> anyhow::Result<Box<dyn BracketRepository>> {
    debug!("connecting to {} backend", config.backend);
    app::build_registry()
        .create(config)
        .await
        .with_context(|| format!("failed to open {} database", config.backend))
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    logging::init_logging(cli.log_level.as_deref())?;
    if let Some(path) = &cli.log_file {
        logging::enable_file_logging(path)?;
    }

    let db_config = DbConfig {
        backend: cli.backend,
        connection_string: cli.db,
    };
    let today = Local::now().date_naive();

    match cli.command {
        Command::Quote {
            category,
            salary,
            as_of,
        } => {
            let repo = open_repository(&db_config).await?;
            let brackets = app::load_brackets(&*repo, &category).await?;
            let report = app::quote(&brackets, &category, &salary, as_of.unwrap_or(today));
            println!("{report}");
        }
        Command::Brackets { category, as_of } => {
            let repo = open_repository(&db_config).await?;
            let brackets = app::load_brackets(&*repo, &category).await?;
            let table = app::bracket_table(&brackets, &category, as_of.unwrap_or(today));
            println!("{table}");
        }
        // Checked locally; no database needed.
        Command::CheckTaxId { id } => {
            let report = app::check_tax_id(&id);
            println!("{report}");
            if !report.is_valid() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
