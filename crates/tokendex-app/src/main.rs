//! Tokendex command-line binary.
//!
//! Runs one collection command per invocation against the local store.
//!
//! # Startup Sequence
//!
//! 1. Parse the command line
//! 2. Load configuration from `tokendex-config.yaml` (or `--config`)
//! 3. Initialize structured logging (tracing) on stderr
//! 4. Open the collection store, creating it on first run
//! 5. Build the generation backend
//! 6. Open the economy controller, granting the initial balance if unset
//! 7. Execute the command, then close the store

mod cli;
mod commands;
mod config;
mod error;

use std::io::{BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use tokendex_db::{Database, SharedDatabase};
use tokendex_economy::EconomyController;
use tokendex_generator::GeneratorBackend;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::{AppConfig, LoggingConfig};
use crate::error::AppError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = err
                .downcast_ref::<AppError>()
                .map_or_else(|| format!("{err:#}"), AppError::user_message);
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(cli.config.as_deref()).map_err(AppError::from)?;
    init_logging(&config.logging);
    tracing::debug!(
        database = %config.database.url,
        backend = ?config.generator.backend,
        "Configuration loaded"
    );

    let shared = SharedDatabase::new(config.database.to_sqlite_config());
    let db = shared.get_or_open().await.map_err(AppError::from)?;

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut out = std::io::stdout().lock();
    run_on_store(db, &config, cli.command, &mut input, &mut out).await?;
    Ok(())
}

/// Run one command on an open store, then close the store whatever the
/// outcome.
async fn run_on_store<R: BufRead, W: Write>(
    db: &Database,
    config: &AppConfig,
    command: Command,
    input: &mut R,
    out: &mut W,
) -> Result<(), AppError> {
    let result = execute_on_store(db, config, command, input, out).await;
    db.close().await;
    result
}

async fn execute_on_store<R: BufRead, W: Write>(
    db: &Database,
    config: &AppConfig,
    command: Command,
    input: &mut R,
    out: &mut W,
) -> Result<(), AppError> {
    let generator = GeneratorBackend::from_config(&config.generator)?;
    let economy = EconomyController::open(db.clone(), generator, config.economy).await?;
    commands::execute(command, &economy, input, out).await
}

/// Log to stderr so stdout carries only command output. `RUST_LOG` wins
/// over the configured level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
