//! High-level pipeline: one full Notion → GitHub reconciliation run.
//!
//! A run:
//!   - fetches the shared pages, the bot's discussions and the bot's issues
//!     concurrently (the thread searches wait for the bot login);
//!   - builds a [`Plan`] from them (see [`crate::plan`]);
//!   - executes the plan, every mutation concurrently (see [`crate::execute`]).
//!
//! Nothing is persisted between runs. Whatever a run leaves half-applied is
//! picked up by the next one.
//!
//! # Error Handling
//! Fetch and plan failures abort before any mutation. Mutation failures are
//! collected first and then reported as [`SyncError::MutationsFailed`].

use serde::Serialize;
use tracing::{error, info};

use crate::config::SyncConfig;
use crate::contract::{DocumentSource, ThreadHost, ThreadKind};
use crate::error::{Result, SyncError};
use crate::execute::{execute_plan, ExecutionReport};
use crate::plan::{build_plan, Plan};

/// What a successful run did.
#[derive(Debug, Clone, Serialize)]
pub struct SynchroniseReport {
    pub plan: Plan,
    pub execution: ExecutionReport,
}

pub async fn synchronise<S, H>(config: &SyncConfig, source: &S, host: &H) -> Result<SynchroniseReport>
where
    S: DocumentSource + ?Sized,
    H: ThreadHost + ?Sized,
{
    info!(dry_run = config.dry_run, "[SYNC] Starting synchronisation run");

    let threads = async {
        let login = host.current_user_login().await.map_err(SyncError::Host)?;
        info!(login = %login, "[SYNC] Resolved bot login");
        futures::try_join!(
            search(host, ThreadKind::Discussion, &login, &config.excluded_repository),
            search(host, ThreadKind::Issue, &login, &config.excluded_repository),
        )
    };
    let documents = async { source.list_documents().await.map_err(SyncError::Source) };
    let (documents, (discussions, issues)) = futures::try_join!(documents, threads)?;
    info!(
        documents = documents.len(),
        discussions = discussions.len(),
        issues = issues.len(),
        "[SYNC] Fetched current state"
    );

    let plan = build_plan(
        source,
        host,
        &documents,
        &discussions,
        &issues,
        &config.header_note,
    )
    .await?;
    plan.trace_summary();

    let execution = execute_plan(host, &plan, config.dry_run).await;
    if let Some(first) = execution.failures.first() {
        error!(
            failed = execution.failures.len(),
            total = execution.total(),
            "[SYNC][ERROR] Some mutations failed"
        );
        return Err(SyncError::MutationsFailed {
            failed: execution.failures.len(),
            total: execution.total(),
            first: first.to_string(),
        });
    }

    info!(
        applied = execution.applied,
        skipped = execution.skipped,
        "[SYNC] Synchronisation run complete"
    );
    Ok(SynchroniseReport { plan, execution })
}

async fn search<H>(
    host: &H,
    kind: ThreadKind,
    login: &str,
    excluded_repository: &str,
) -> Result<Vec<crate::contract::Thread>>
where
    H: ThreadHost + ?Sized,
{
    host.search_threads(kind, login, excluded_repository)
        .await
        .map_err(SyncError::Host)
}
