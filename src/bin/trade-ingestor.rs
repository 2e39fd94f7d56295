//! # Trade Ingestor CLI
//!
//! Loads exchange trade files into PostgreSQL and queries the windowed aggregate.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use trade_ingestor::config::{ConfigManager, IngestorConfig};
use trade_ingestor::database::{DatabaseConnection, DatabaseMigrations};
use trade_ingestor::logging::init_structured_logging;
use trade_ingestor::services::TradeService;
use trade_ingestor::source::CsvSourceReader;
use trade_ingestor::storage::PgTradeStore;

#[derive(Parser)]
#[command(name = "trade-ingestor")]
#[command(about = "Ingest exchange trade files and query aggregated trade data")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// TOML configuration file (default: config/trade-ingestor.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Database(DatabaseCommand),

    /// Print the resolved configuration with credentials masked
    Config,
}

/// Commands that need a database connection
#[derive(Subcommand)]
enum DatabaseCommand {
    /// Load every trade file under PATH into the trades table
    Ingest {
        /// File or directory to ingest (default: reader.path / FILE_PATH)
        path: Option<PathBuf>,

        /// Do not apply pending schema migrations first
        #[arg(long)]
        skip_migrations: bool,
    },

    /// Print max price and max daily volume for a ticker as JSON
    Aggregate {
        #[arg(short, long)]
        ticker: String,

        /// First trade date to include, YYYY-MM-DD (default: aggregation.window_days ago)
        #[arg(short, long)]
        start: Option<NaiveDate>,
    },

    /// Apply pending schema migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = ConfigManager::load_from(cli.config.as_deref())
        .context("failed to load configuration")?;
    let config = manager.config();
    init_structured_logging(&config.logging);

    match cli.command {
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&manager.debug_config())?);
            Ok(())
        }
        Commands::Database(command) => {
            let db = DatabaseConnection::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            let outcome = run(command, config, &db).await;
            db.close().await;
            outcome
        }
    }
}

async fn run(
    command: DatabaseCommand,
    config: &IngestorConfig,
    db: &DatabaseConnection,
) -> Result<()> {
    let source = Arc::new(CsvSourceReader::new(config.reader.options()?));
    let store = Arc::new(PgTradeStore::new(db.pool().clone()));
    let service = TradeService::new(store, source)
        .with_batch_size(config.ingestion.batch_size)
        .with_window_days(config.aggregation.window_days);

    match command {
        DatabaseCommand::Migrate => {
            DatabaseMigrations::run_all(db.pool())
                .await
                .context("failed to run migrations")?;
        }

        DatabaseCommand::Ingest {
            path,
            skip_migrations,
        } => {
            let path = path
                .or_else(|| config.reader.path.clone())
                .context("no input path: pass PATH or set FILE_PATH / reader.path")?;

            if !skip_migrations {
                DatabaseMigrations::run_all(db.pool())
                    .await
                    .context("failed to run migrations")?;
            }

            let cancel = CancellationToken::new();
            let watchdog = spawn_cancel_watchdog(cancel.clone(), config.ingestion.timeout());

            let result = service.ingest_files(&path, cancel).await;
            watchdog.abort();

            match result {
                Ok(summary) => {
                    info!(
                        path = %path.display(),
                        files = summary.files,
                        records = summary.records,
                        batches = summary.batches,
                        rows_written = summary.rows_written,
                        "Ingestion finished"
                    );
                    println!("{}", serde_json::to_string(&summary)?);
                }
                Err(err) => {
                    error!(path = %path.display(), error = %err, "Ingestion failed");
                    return Err(err).context(format!("ingestion of {} failed", path.display()));
                }
            }
        }

        DatabaseCommand::Aggregate { ticker, start } => {
            let data = service.get_aggregated_data(&ticker, start).await?;
            println!("{}", serde_json::to_string(&data)?);
        }
    }

    Ok(())
}

/// Cancel the run on Ctrl-C or once `timeout` elapses, whichever comes first
fn spawn_cancel_watchdog(
    cancel: CancellationToken,
    timeout: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupt received, cancelling ingestion");
                cancel.cancel();
            }
            _ = tokio::time::sleep(timeout) => {
                warn!(timeout_seconds = timeout.as_secs(), "Ingestion timed out, cancelling");
                cancel.cancel();
            }
        }
    })
}
