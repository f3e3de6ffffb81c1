//! Space Migrate Binary
//!
//! Migrates the given content types from the source environment to the target
//! environment and prints which identifiers made it. Environments are read
//! from JSON snapshots; `FROM_ENV`/`TO_ENV` (or the config file) name them.

use anyhow::Context;
use clap::Parser;
use space_migrator::config::ConfigLoader;
use space_migrator::logging;
use space_migrator::models::MigrationRequest;
use space_migrator::orchestration::{MigrationOrchestrator, OrchestratorConfig};
use space_migrator::remote::{InMemorySpace, RemoteWriteClient};
use space_migrator::reporting::TextReportFormatter;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "space-migrate")]
#[command(about = "Migrate content types, editor metadata and entries between environments")]
#[command(version)]
struct Cli {
    /// Content type ids to migrate (space separated values are split)
    #[arg(required = true)]
    ids: Vec<String>,

    /// Migrate the entries of each content type too (Y/N)
    #[arg(long, default_value = "y")]
    records: String,

    /// Snapshot of the source environment
    #[arg(long)]
    source: PathBuf,

    /// Snapshot of the target environment; starts empty when omitted
    #[arg(long)]
    target: Option<PathBuf>,

    /// Configuration file path (optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the resulting target environment to this file
    #[arg(long)]
    write_target: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    logging::init_structured_logging();
    let cli = Cli::parse();

    let config = ConfigLoader::load(cli.config.as_deref()).context("loading configuration")?;
    let request = MigrationRequest::from_prompt_input(&cli.ids.join(" "), &cli.records)
        .context("reading migration request")?;

    let source = Arc::new(
        InMemorySpace::load_snapshot(config.source_environment.clone(), &cli.source)
            .with_context(|| format!("loading source snapshot {}", cli.source.display()))?,
    );
    let target = Arc::new(match &cli.target {
        Some(path) => InMemorySpace::load_snapshot(config.target_environment.clone(), path)
            .with_context(|| format!("loading target snapshot {}", path.display()))?,
        None => InMemorySpace::empty(config.target_environment.clone()),
    });

    info!(
        space = %config.space,
        from = %config.source_environment,
        to = %config.target_environment,
        ids = request.len(),
        migrate_records = request.migrate_records(),
        "Starting space migration"
    );

    let writer: Arc<dyn RemoteWriteClient> = target.clone();
    let orchestrator =
        MigrationOrchestrator::new(source, writer, OrchestratorConfig::from(&config));

    // Wait for shutdown signal; in-flight resources finish their current stage
    let cancellation = orchestrator.cancellation();
    let interrupt = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            warn!("Shutdown signal received");
            cancellation.cancel("interrupted by Ctrl-C");
        }
    });

    let summary = orchestrator.run(&request).await;
    interrupt.abort();

    println!("{}", TextReportFormatter::render(&summary));

    if let Some(path) = &cli.write_target {
        target
            .save_snapshot(path)
            .with_context(|| format!("writing target snapshot {}", path.display()))?;
        info!(file = %path.display(), "Target snapshot written");
    }

    Ok(if summary.all_migrated() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
