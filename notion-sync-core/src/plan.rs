//! Plan building: the reconciliation step.
//!
//! Given every shared page and every thread the bot has authored, decide per
//! page what must happen on GitHub:
//!
//! | page directive | matching thread of that kind | action                    |
//! |----------------|------------------------------|---------------------------|
//! | none           | discussion and/or issue      | delete each match         |
//! | discussion     | discussion                   | update discussion         |
//! | discussion     | none                         | create discussion         |
//! | issue          | issue                        | update issue              |
//! | issue          | none                         | create issue              |
//!
//! The discussion and issue match checks are independent. A page whose
//! directive points at one kind while a thread of the other kind still carries
//! its signature also gets that stale thread deleted, so switching a page from
//! `discussion` to `issue` yields a delete and a create in the same plan.
//! Every plan item is self-contained: the executor needs no further lookups.

use futures::future::try_join_all;
use serde::Serialize;
use tracing::{debug, info};

use crate::contract::{Document, DocumentSource, Thread, ThreadHost};
use crate::error::{Result, SyncError};
use crate::matcher::find_thread;
use crate::render::render_body;
use crate::resolver::{find_category, RepositoryResolver};
use crate::routing::{classify, Directive};
use crate::signature::compose_signature;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscussionCreate {
    pub document_id: String,
    pub repository_id: String,
    pub category_id: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscussionUpdate {
    pub document_id: String,
    pub thread_id: String,
    pub repository_id: String,
    pub category_id: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueCreate {
    pub document_id: String,
    pub repository_id: String,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueUpdate {
    pub document_id: String,
    pub thread_id: String,
    pub repository_id: String,
    pub title: String,
    pub body: String,
}

/// Deletion of a stale thread; the title is kept for logging only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadDelete {
    pub thread_id: String,
    pub repository_id: String,
    pub title: String,
}

impl From<&Thread> for ThreadDelete {
    fn from(thread: &Thread) -> Self {
        Self {
            thread_id: thread.id.clone(),
            repository_id: thread.repository.id.clone(),
            title: thread.title.clone(),
        }
    }
}

/// Create/update/delete lists for one thread kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindPlan<C, U> {
    pub create: Vec<C>,
    pub update: Vec<U>,
    pub delete: Vec<ThreadDelete>,
}

impl<C, U> Default for KindPlan<C, U> {
    fn default() -> Self {
        Self {
            create: Vec::new(),
            update: Vec::new(),
            delete: Vec::new(),
        }
    }
}

impl<C, U> KindPlan<C, U> {
    pub fn len(&self) -> usize {
        self.create.len() + self.update.len() + self.delete.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub discussions: KindPlan<DiscussionCreate, DiscussionUpdate>,
    pub issues: KindPlan<IssueCreate, IssueUpdate>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.discussions.len() + self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&mut self, item: PlanItem) {
        match item {
            PlanItem::CreateDiscussion(c) => self.discussions.create.push(c),
            PlanItem::UpdateDiscussion(u) => self.discussions.update.push(u),
            PlanItem::DeleteDiscussion(d) => self.discussions.delete.push(d),
            PlanItem::CreateIssue(c) => self.issues.create.push(c),
            PlanItem::UpdateIssue(u) => self.issues.update.push(u),
            PlanItem::DeleteIssue(d) => self.issues.delete.push(d),
        }
    }

    pub fn trace_summary(&self) {
        info!(
            discussions_create = self.discussions.create.len(),
            discussions_update = self.discussions.update.len(),
            discussions_delete = self.discussions.delete.len(),
            issues_create = self.issues.create.len(),
            issues_update = self.issues.update.len(),
            issues_delete = self.issues.delete.len(),
            "Built sync plan"
        );
    }
}

enum PlanItem {
    CreateDiscussion(DiscussionCreate),
    UpdateDiscussion(DiscussionUpdate),
    DeleteDiscussion(ThreadDelete),
    CreateIssue(IssueCreate),
    UpdateIssue(IssueUpdate),
    DeleteIssue(ThreadDelete),
}

/// Builds the plan for one run.
///
/// Pages are planned concurrently; the resulting lists keep the order of
/// `documents`. Any resolution failure (unknown repository, unknown
/// discussion category) fails the whole build.
pub async fn build_plan<S, H>(
    source: &S,
    host: &H,
    documents: &[Document],
    discussions: &[Thread],
    issues: &[Thread],
    header_note: &str,
) -> Result<Plan>
where
    S: DocumentSource + ?Sized,
    H: ThreadHost + ?Sized,
{
    let resolver = RepositoryResolver::new(host);
    let planned = try_join_all(documents.iter().map(|document| {
        plan_document(source, &resolver, document, discussions, issues, header_note)
    }))
    .await?;

    let mut plan = Plan::default();
    for item in planned.into_iter().flatten() {
        plan.push(item);
    }
    Ok(plan)
}

async fn plan_document<S, H>(
    source: &S,
    resolver: &RepositoryResolver<'_, H>,
    document: &Document,
    discussions: &[Thread],
    issues: &[Thread],
    header_note: &str,
) -> Result<Vec<PlanItem>>
where
    S: DocumentSource + ?Sized,
    H: ThreadHost + ?Sized,
{
    let Some(title) = &document.title else {
        debug!(document_id = %document.id, "Skipping page without a title");
        return Ok(Vec::new());
    };
    debug!(document_id = %document.id, title = %title, "Building plan for page");

    let blocks = source
        .render_document(&document.id)
        .await
        .map_err(SyncError::Source)?;
    let directive = classify(blocks.first());
    let signature = compose_signature(&document.id);
    let existing_discussion = find_thread(&signature, discussions);
    let existing_issue = find_thread(&signature, issues);

    let Some(directive) = directive else {
        let mut items = Vec::new();
        if let Some(discussion) = existing_discussion {
            items.push(PlanItem::DeleteDiscussion(discussion.into()));
        }
        if let Some(issue) = existing_issue {
            items.push(PlanItem::DeleteIssue(issue.into()));
        }
        return Ok(items);
    };

    let body = render_body(&signature, header_note, document.url.as_deref(), &blocks);
    let title = title.to_string();
    let document_id = document.id.clone();

    let mut items = Vec::with_capacity(2);
    match &directive {
        Directive::Discussion { .. } => {
            if let Some(issue) = existing_issue {
                items.push(PlanItem::DeleteIssue(issue.into()));
            }
        }
        Directive::Issue { .. } => {
            if let Some(discussion) = existing_discussion {
                items.push(PlanItem::DeleteDiscussion(discussion.into()));
            }
        }
    }

    let item = match directive {
        Directive::Discussion {
            repo,
            category_name,
        } => {
            let info = resolver.resolve_reference(&repo).await?;
            let category =
                find_category(&info, &category_name).ok_or_else(|| SyncError::CategoryNotFound {
                    category: category_name.clone(),
                    repository: repo.clone(),
                })?;
            match existing_discussion {
                Some(discussion) => PlanItem::UpdateDiscussion(DiscussionUpdate {
                    document_id,
                    thread_id: discussion.id.clone(),
                    repository_id: discussion.repository.id.clone(),
                    category_id: category.id.clone(),
                    title,
                    body,
                }),
                None => PlanItem::CreateDiscussion(DiscussionCreate {
                    document_id,
                    repository_id: info.id.clone(),
                    category_id: category.id.clone(),
                    title,
                    body,
                }),
            }
        }
        Directive::Issue { repo } => match existing_issue {
            Some(issue) => PlanItem::UpdateIssue(IssueUpdate {
                document_id,
                thread_id: issue.id.clone(),
                repository_id: issue.repository.id.clone(),
                title,
                body,
            }),
            None => {
                let info = resolver.resolve_reference(&repo).await?;
                PlanItem::CreateIssue(IssueCreate {
                    document_id,
                    repository_id: info.id,
                    title,
                    body,
                })
            }
        },
    };
    items.push(item);
    Ok(items)
}
