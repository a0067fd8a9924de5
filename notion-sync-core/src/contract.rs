//! # contract: interfaces to the two systems being reconciled
//!
//! The reconciliation engine never talks HTTP itself. It reads documents
//! through a [`DocumentSource`] and reads/writes threads through a
//! [`ThreadHost`]. Both traits are plain async interfaces:
//! - the Notion client in [`crate::notion`] implements [`DocumentSource`];
//! - the GitHub GraphQL client in the `notion-sync` crate implements [`ThreadHost`];
//! - tests use the `mockall` mocks exported under the `test-export-mocks` feature.
//!
//! All methods return [`BoxError`] so implementors can surface transport,
//! decoding and API errors without the engine knowing their concrete types.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

/// Error type returned by every contract method.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A validated, non-empty page title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTitle(String);

impl DocumentTitle {
    /// Returns `None` for titles that are empty after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            None
        } else {
            Some(Self(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A source document (a Notion page), as listed by [`DocumentSource::list_documents`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Document {
    pub id: String,
    /// Absent when the page has no extractable title; such pages are never published.
    pub title: Option<DocumentTitle>,
    pub url: Option<String>,
}

/// One rendered node of a document.
///
/// `parent` holds the block's own rendered markdown. The first block of a
/// document doubles as the routing channel (see [`crate::routing`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Block {
    pub block_type: String,
    pub parent: String,
    pub children: Vec<Block>,
}

impl Block {
    pub fn new(block_type: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            parent: parent.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.children = children;
        self
    }
}

/// The two kinds of GitHub thread this system manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadKind {
    Discussion,
    Issue,
}

impl std::fmt::Display for ThreadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ThreadKind::Discussion => f.write_str("discussion"),
            ThreadKind::Issue => f.write_str("issue"),
        }
    }
}

/// Repository owning a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRef {
    pub id: String,
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    /// `owner/name`.
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// An existing discussion or issue authored by the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thread {
    pub id: String,
    pub kind: ThreadKind,
    pub title: String,
    pub body: String,
    pub repository: RepositoryRef,
    pub author_login: Option<String>,
    /// Only set for discussions.
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscussionCategory {
    pub id: String,
    pub name: String,
}

/// Result of resolving `owner/name` on the hosting side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryInfo {
    pub id: String,
    pub discussion_categories: Vec<DiscussionCategory>,
}

/// Reference to a freshly created thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadRef {
    pub id: String,
    pub url: Option<String>,
}

/// Read access to the source-of-truth workspace.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// List every page shared with the integration.
    async fn list_documents(&self) -> Result<Vec<Document>, BoxError>;

    /// Fetch a page's content as a block tree, first block first.
    async fn render_document(&self, document_id: &str) -> Result<Vec<Block>, BoxError>;
}

/// Read/write access to discussions and issues on the hosting platform.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ThreadHost: Send + Sync {
    /// Login of the authenticated bot account.
    async fn current_user_login(&self) -> Result<String, BoxError>;

    /// All threads of `kind` authored by `author_login`, excluding `excluded_repository`.
    async fn search_threads(
        &self,
        kind: ThreadKind,
        author_login: &str,
        excluded_repository: &str,
    ) -> Result<Vec<Thread>, BoxError>;

    /// `Ok(None)` when the repository does not exist or is not visible to the bot.
    async fn resolve_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<RepositoryInfo>, BoxError>;

    async fn create_discussion(
        &self,
        repository_id: &str,
        category_id: &str,
        title: &str,
        body: &str,
    ) -> Result<ThreadRef, BoxError>;

    async fn update_discussion(
        &self,
        thread_id: &str,
        category_id: &str,
        title: &str,
        body: &str,
    ) -> Result<(), BoxError>;

    async fn delete_discussion(&self, thread_id: &str) -> Result<(), BoxError>;

    async fn create_issue(
        &self,
        repository_id: &str,
        title: &str,
        body: &str,
    ) -> Result<ThreadRef, BoxError>;

    async fn update_issue(&self, thread_id: &str, title: &str, body: &str)
        -> Result<(), BoxError>;

    async fn delete_issue(&self, thread_id: &str) -> Result<(), BoxError>;
}
