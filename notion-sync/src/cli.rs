/// # notion-sync CLI Interface (Module)
///
/// Command parsing and the async entrypoint [`run`], shared by `main` and the
/// integration tests. Reconciliation logic lives in `notion-sync-core`; this
/// module only wires configuration, clients and triggers together.
///
/// - `sync`: one scheduled-style run, then exit (cron, CI).
/// - `serve`: HTTP triggers, plus the interval loop when configured.
use crate::load_config::load_config;
use crate::server::serve;
use anyhow::Result;
use clap::{Parser, Subcommand};
use notion_sync_core::synchronise::synchronise;
use std::path::PathBuf;

/// CLI for notion-sync: mirror shared Notion pages into GitHub threads.
#[derive(Parser)]
#[clap(
    name = "notion-sync",
    version,
    about = "Mirror shared Notion pages into GitHub discussions and issues"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one synchronisation and exit
    Sync {
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Build and log the plan without mutating GitHub (same as DRY_RUN=1)
        #[clap(long)]
        dry_run: bool,
    },
    /// Serve the on-demand HTTP trigger and the optional scheduled loop
    Serve {
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config, dry_run } => {
            let mut config = load_config(config.as_deref())?;
            config.dry_run |= dry_run;
            config.trace_loaded();
            tracing::info!(command = "sync", "Starting synchronisation process");

            let source = config.notion_client();
            let host = config.github_client();
            match synchronise(&config.sync_config(), &source, &host).await {
                Ok(report) => {
                    tracing::info!(
                        command = "sync",
                        planned = report.plan.len(),
                        applied = report.execution.applied,
                        skipped = report.execution.skipped,
                        "Synchronisation complete"
                    );
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "sync", error = %e, "Synchronisation failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::Serve { config } => {
            let config = load_config(config.as_deref())?;
            config.trace_loaded();
            tracing::info!(command = "serve", "Starting trigger server");
            serve(config).await
        }
    }
}
