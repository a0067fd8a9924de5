#![doc = "GitHub GraphQL client: the real `ThreadHost` used by both triggers."]
//
//! # GitHub Integration
//!
//! [`GitHubClient`] speaks the GitHub GraphQL API (`POST {base}/graphql`) with
//! a bot token and implements [`ThreadHost`] from `notion-sync-core`.
//!
//! - Thread search uses the `search` connection (first 100 results) with the
//!   query `author:{login} -repo:{excluded}` and keeps only nodes whose
//!   `__typename` matches the requested kind.
//! - Repository lookup follows renames and reads up to 50 discussion
//!   categories. A missing repository is `Ok(None)`, not an error.
//! - Any other entry in a GraphQL `errors` array fails the call.

use async_trait::async_trait;
use notion_sync_core::contract::{
    BoxError, DiscussionCategory, RepositoryInfo, RepositoryRef, Thread, ThreadHost, ThreadKind,
    ThreadRef,
};
use reqwest::header::USER_AGENT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

pub const GITHUB_API_BASE: &str = "https://api.github.com";

const VIEWER_QUERY: &str = "query currentUser { viewer { login } }";

const DISCUSSIONS_QUERY: &str = r#"
query myDiscussions($q: String!) {
  search(type: DISCUSSION, query: $q, first: 100) {
    nodes {
      __typename
      ... on Discussion {
        id
        title
        body
        category { id }
        repository { id name owner { login } }
        author { login }
      }
    }
  }
}"#;

const ISSUES_QUERY: &str = r#"
query myIssues($q: String!) {
  search(type: ISSUE, query: $q, first: 100) {
    nodes {
      __typename
      ... on Issue {
        id
        title
        body
        repository { id name owner { login } }
        author { login }
      }
    }
  }
}"#;

const REPOSITORY_QUERY: &str = r#"
query repository($name: String!, $owner: String!) {
  repository(name: $name, owner: $owner, followRenames: true) {
    id
    discussionCategories(first: 50) {
      nodes { id name }
    }
  }
}"#;

const CREATE_DISCUSSION: &str = r#"
mutation createDiscussion($repoId: ID!, $categoryId: ID!, $title: String!, $body: String!) {
  createDiscussion(input: { repositoryId: $repoId, categoryId: $categoryId, title: $title, body: $body }) {
    discussion { id url }
  }
}"#;

const UPDATE_DISCUSSION: &str = r#"
mutation updateDiscussion($id: ID!, $categoryId: ID!, $title: String!, $body: String!) {
  updateDiscussion(input: { discussionId: $id, categoryId: $categoryId, title: $title, body: $body }) {
    __typename
  }
}"#;

const DELETE_DISCUSSION: &str = r#"
mutation deleteDiscussion($id: ID!) {
  deleteDiscussion(input: { id: $id }) { __typename }
}"#;

const CREATE_ISSUE: &str = r#"
mutation createIssue($repoId: ID!, $title: String!, $body: String!) {
  createIssue(input: { repositoryId: $repoId, title: $title, body: $body }) {
    issue { id url }
  }
}"#;

const UPDATE_ISSUE: &str = r#"
mutation updateIssue($id: ID!, $title: String!, $body: String!) {
  updateIssue(input: { id: $id, title: $title, body: $body }) { __typename }
}"#;

const DELETE_ISSUE: &str = r#"
mutation deleteIssue($id: ID!) {
  deleteIssue(input: { issueId: $id }) { __typename }
}"#;

pub struct GitHubClient {
    http: Client,
    endpoint: String,
    token: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            endpoint: format!("{GITHUB_API_BASE}/graphql"),
            token: token.into(),
        }
    }

    /// Points the client at another API root; `/graphql` is appended.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.endpoint = format!("{}/graphql", base_url.trim_end_matches('/'));
        self
    }

    async fn post<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<GraphQlResponse<T>, BoxError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .header(USER_AGENT, concat!("notion-sync/", env!("CARGO_PKG_VERSION")))
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
            tracing::error!(status = %status, "GitHub API returned error. Response body: {text}");
            return Err(format!("GitHub API error {status}: {text}").into());
        }
        Ok(response.json::<GraphQlResponse<T>>().await?)
    }

    /// Runs `query` and insists on a clean response.
    async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T, BoxError> {
        let response = self.post::<T>(query, variables).await?;
        if !response.errors.is_empty() {
            return Err(graphql_errors(&response.errors));
        }
        response
            .data
            .ok_or_else(|| BoxError::from("GitHub GraphQL response carried no data"))
    }
}

#[async_trait]
impl ThreadHost for GitHubClient {
    async fn current_user_login(&self) -> Result<String, BoxError> {
        let data: ViewerData = self.execute(VIEWER_QUERY, json!({})).await?;
        tracing::info!(login = %data.viewer.login, "Authenticated against GitHub");
        Ok(data.viewer.login)
    }

    async fn search_threads(
        &self,
        kind: ThreadKind,
        author_login: &str,
        excluded_repository: &str,
    ) -> Result<Vec<Thread>, BoxError> {
        let query = match kind {
            ThreadKind::Discussion => DISCUSSIONS_QUERY,
            ThreadKind::Issue => ISSUES_QUERY,
        };
        let q = search_query(author_login, excluded_repository);
        let data: SearchData = self.execute(query, json!({ "q": q })).await?;

        let threads: Vec<Thread> = data
            .search
            .nodes
            .into_iter()
            .flatten()
            .filter_map(|node| match (node, kind) {
                (SearchNode::Discussion(raw), ThreadKind::Discussion) => Some(raw.into_thread(kind)),
                (SearchNode::Issue(raw), ThreadKind::Issue) => Some(raw.into_thread(kind)),
                _ => None,
            })
            .collect();
        tracing::info!(%kind, query = %q, count = threads.len(), "Fetched existing threads");
        Ok(threads)
    }

    async fn resolve_repository(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<RepositoryInfo>, BoxError> {
        let response = self
            .post::<RepositoryData>(REPOSITORY_QUERY, json!({ "owner": owner, "name": name }))
            .await?;

        // A missing repository comes back as `repository: null` plus a NOT_FOUND error.
        let unexpected: Vec<_> = response
            .errors
            .iter()
            .filter(|e| e.kind.as_deref() != Some("NOT_FOUND"))
            .cloned()
            .collect();
        if !unexpected.is_empty() {
            return Err(graphql_errors(&unexpected));
        }

        let Some(repository) = response.data.and_then(|d| d.repository) else {
            tracing::warn!(owner, name, "Repository not found on GitHub");
            return Ok(None);
        };
        Ok(Some(RepositoryInfo {
            id: repository.id,
            discussion_categories: repository
                .discussion_categories
                .nodes
                .into_iter()
                .flatten()
                .map(|c| DiscussionCategory {
                    id: c.id,
                    name: c.name,
                })
                .collect(),
        }))
    }

    async fn create_discussion(
        &self,
        repository_id: &str,
        category_id: &str,
        title: &str,
        body: &str,
    ) -> Result<ThreadRef, BoxError> {
        let data: CreateDiscussionData = self
            .execute(
                CREATE_DISCUSSION,
                json!({
                    "repoId": repository_id,
                    "categoryId": category_id,
                    "title": title,
                    "body": body,
                }),
            )
            .await?;
        let created = data.create_discussion.discussion;
        tracing::info!(id = %created.id, url = ?created.url, "Created discussion");
        Ok(created.into())
    }

    async fn update_discussion(
        &self,
        thread_id: &str,
        category_id: &str,
        title: &str,
        body: &str,
    ) -> Result<(), BoxError> {
        self.execute::<Value>(
            UPDATE_DISCUSSION,
            json!({ "id": thread_id, "categoryId": category_id, "title": title, "body": body }),
        )
        .await?;
        Ok(())
    }

    async fn delete_discussion(&self, thread_id: &str) -> Result<(), BoxError> {
        self.execute::<Value>(DELETE_DISCUSSION, json!({ "id": thread_id }))
            .await?;
        Ok(())
    }

    async fn create_issue(
        &self,
        repository_id: &str,
        title: &str,
        body: &str,
    ) -> Result<ThreadRef, BoxError> {
        let data: CreateIssueData = self
            .execute(
                CREATE_ISSUE,
                json!({ "repoId": repository_id, "title": title, "body": body }),
            )
            .await?;
        let created = data.create_issue.issue;
        tracing::info!(id = %created.id, url = ?created.url, "Created issue");
        Ok(created.into())
    }

    async fn update_issue(&self, thread_id: &str, title: &str, body: &str) -> Result<(), BoxError> {
        self.execute::<Value>(
            UPDATE_ISSUE,
            json!({ "id": thread_id, "title": title, "body": body }),
        )
        .await?;
        Ok(())
    }

    async fn delete_issue(&self, thread_id: &str) -> Result<(), BoxError> {
        self.execute::<Value>(DELETE_ISSUE, json!({ "id": thread_id }))
            .await?;
        Ok(())
    }
}

/// Search string for the bot's own threads, minus the excluded repository.
pub fn search_query(author_login: &str, excluded_repository: &str) -> String {
    if excluded_repository.is_empty() {
        format!("author:{author_login}")
    } else {
        format!("author:{author_login} -repo:{excluded_repository}")
    }
}

fn graphql_errors(errors: &[GraphQlError]) -> BoxError {
    let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
    tracing::error!(?messages, "GitHub GraphQL request failed");
    format!("GitHub GraphQL error: {}", messages.join("; ")).into()
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Clone, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Login {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ViewerData {
    viewer: Login,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    search: Connection<SearchNode>,
}

#[derive(Debug, Deserialize)]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<Option<T>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
enum SearchNode {
    Discussion(RawThread),
    Issue(RawThread),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct IdNode {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    id: String,
    name: String,
    owner: Login,
}

#[derive(Debug, Deserialize)]
struct RawThread {
    id: String,
    title: String,
    #[serde(default)]
    body: String,
    repository: RawRepository,
    author: Option<Login>,
    #[serde(default)]
    category: Option<IdNode>,
}

impl RawThread {
    fn into_thread(self, kind: ThreadKind) -> Thread {
        Thread {
            id: self.id,
            kind,
            title: self.title,
            body: self.body,
            repository: RepositoryRef {
                id: self.repository.id,
                owner: self.repository.owner.login,
                name: self.repository.name,
            },
            author_login: self.author.map(|a| a.login),
            category_id: self.category.map(|c| c.id),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryData {
    repository: Option<RawRepositoryInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRepositoryInfo {
    id: String,
    discussion_categories: Connection<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedThread {
    id: String,
    url: Option<String>,
}

impl From<CreatedThread> for ThreadRef {
    fn from(created: CreatedThread) -> Self {
        ThreadRef {
            id: created.id,
            url: created.url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDiscussionData {
    create_discussion: CreateDiscussionPayload,
}

#[derive(Debug, Deserialize)]
struct CreateDiscussionPayload {
    discussion: CreatedThread,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateIssueData {
    create_issue: CreateIssuePayload,
}

#[derive(Debug, Deserialize)]
struct CreateIssuePayload {
    issue: CreatedThread,
}
