//! Plan execution.
//!
//! Every item of every list is one independent mutation. All of them run
//! concurrently and a failing mutation neither cancels nor rolls back the
//! others: the next run re-reconciles whatever was left behind.
//!
//! Dry run is checked right before each mutation, so a dry run logs exactly
//! the same per-item lines as a real one.

use std::fmt;
use std::future::Future;

use futures::future::{join_all, BoxFuture, FutureExt};
use serde::Serialize;
use tracing::{error, info};

use crate::contract::{BoxError, ThreadHost};
use crate::plan::Plan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutation {
    CreateDiscussion,
    UpdateDiscussion,
    DeleteDiscussion,
    CreateIssue,
    UpdateIssue,
    DeleteIssue,
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Mutation::CreateDiscussion => "create discussion",
            Mutation::UpdateDiscussion => "update discussion",
            Mutation::DeleteDiscussion => "delete discussion",
            Mutation::CreateIssue => "create issue",
            Mutation::UpdateIssue => "update issue",
            Mutation::DeleteIssue => "delete issue",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationFailure {
    pub mutation: Mutation,
    /// Thread id for updates/deletes, title for creates.
    pub target: String,
    pub error: String,
}

impl fmt::Display for MutationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}: {}", self.mutation, self.target, self.error)
    }
}

/// Outcome counts of one plan execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionReport {
    pub applied: usize,
    /// Mutations skipped because of dry run.
    pub skipped: usize,
    pub failures: Vec<MutationFailure>,
}

impl ExecutionReport {
    pub fn total(&self) -> usize {
        self.applied + self.skipped + self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

enum Outcome {
    Applied,
    Skipped,
    Failed(MutationFailure),
}

/// Applies `plan` against `host`. Never fails as a whole: per-item failures
/// are collected in the returned report.
pub async fn execute_plan<H>(host: &H, plan: &Plan, dry_run: bool) -> ExecutionReport
where
    H: ThreadHost + ?Sized,
{
    let mut tasks: Vec<BoxFuture<'_, Outcome>> = Vec::with_capacity(plan.len());

    for item in &plan.discussions.delete {
        tasks.push(
            apply(Mutation::DeleteDiscussion, &item.thread_id, dry_run, || {
                host.delete_discussion(&item.thread_id)
            })
            .boxed(),
        );
    }
    for item in &plan.discussions.update {
        tasks.push(
            apply(Mutation::UpdateDiscussion, &item.thread_id, dry_run, || {
                host.update_discussion(&item.thread_id, &item.category_id, &item.title, &item.body)
            })
            .boxed(),
        );
    }
    for item in &plan.discussions.create {
        tasks.push(
            apply(Mutation::CreateDiscussion, &item.title, dry_run, || {
                host.create_discussion(
                    &item.repository_id,
                    &item.category_id,
                    &item.title,
                    &item.body,
                )
            })
            .boxed(),
        );
    }
    for item in &plan.issues.delete {
        tasks.push(
            apply(Mutation::DeleteIssue, &item.thread_id, dry_run, || {
                host.delete_issue(&item.thread_id)
            })
            .boxed(),
        );
    }
    for item in &plan.issues.update {
        tasks.push(
            apply(Mutation::UpdateIssue, &item.thread_id, dry_run, || {
                host.update_issue(&item.thread_id, &item.title, &item.body)
            })
            .boxed(),
        );
    }
    for item in &plan.issues.create {
        tasks.push(
            apply(Mutation::CreateIssue, &item.title, dry_run, || {
                host.create_issue(&item.repository_id, &item.title, &item.body)
            })
            .boxed(),
        );
    }

    let mut report = ExecutionReport::default();
    for outcome in join_all(tasks).await {
        match outcome {
            Outcome::Applied => report.applied += 1,
            Outcome::Skipped => report.skipped += 1,
            Outcome::Failed(failure) => report.failures.push(failure),
        }
    }
    info!(
        applied = report.applied,
        skipped = report.skipped,
        failed = report.failures.len(),
        dry_run,
        "Executed sync plan"
    );
    report
}

async fn apply<F, Fut, T>(mutation: Mutation, subject: &str, dry_run: bool, call: F) -> Outcome
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, BoxError>>,
{
    info!(%mutation, subject, dry_run, "Applying mutation");
    if dry_run {
        return Outcome::Skipped;
    }
    match call().await {
        Ok(_) => {
            info!(%mutation, subject, "Mutation applied");
            Outcome::Applied
        }
        Err(e) => {
            error!(%mutation, subject, error = %e, "Mutation failed");
            Outcome::Failed(MutationFailure {
                mutation,
                target: subject.to_string(),
                error: e.to_string(),
            })
        }
    }
}
