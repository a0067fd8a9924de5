use notion_sync::github::{search_query, GitHubClient};
use notion_sync_core::contract::{ThreadHost, ThreadKind};
use serde_json::json;
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new("gh_test_token").with_base_url(&server.uri())
}

fn repository_node() -> serde_json::Value {
    json!({"id": "R_repo", "name": "repo", "owner": {"login": "org"}})
}

#[tokio::test]
async fn current_user_login_reads_the_viewer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("Authorization", "Bearer gh_test_token"))
        .and(body_string_contains("viewer"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"viewer": {"login": "guild-bot"}}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let login = client(&server).current_user_login().await.unwrap();
    assert_eq!(login, "guild-bot");
}

#[tokio::test]
async fn discussion_search_keeps_only_discussions() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("type: DISCUSSION"))
        .and(body_partial_json(json!({
            "variables": {"q": "author:guild-bot -repo:the-guild-org/crisp-chats"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"search": {"nodes": [
            {
                "__typename": "Discussion",
                "id": "D_1",
                "title": "Setup Guide",
                "body": "<!-- page-1 -->\nbody",
                "category": {"id": "DC_faq"},
                "repository": repository_node(),
                "author": {"login": "guild-bot"}
            },
            {"__typename": "PullRequest"},
            null
        ]}}})))
        .mount(&server)
        .await;

    let threads = client(&server)
        .search_threads(ThreadKind::Discussion, "guild-bot", "the-guild-org/crisp-chats")
        .await
        .unwrap();

    assert_eq!(threads.len(), 1);
    let thread = &threads[0];
    assert_eq!(thread.id, "D_1");
    assert_eq!(thread.kind, ThreadKind::Discussion);
    assert_eq!(thread.category_id.as_deref(), Some("DC_faq"));
    assert_eq!(thread.repository.id, "R_repo");
    assert_eq!(thread.repository.full_name(), "org/repo");
    assert_eq!(thread.author_login.as_deref(), Some("guild-bot"));
}

#[tokio::test]
async fn issue_search_ignores_discussion_nodes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("type: ISSUE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"search": {"nodes": [
            {
                "__typename": "Issue",
                "id": "I_1",
                "title": "Bug X",
                "body": "<!-- page-2 -->",
                "repository": repository_node(),
                "author": null
            },
            {
                "__typename": "Discussion",
                "id": "D_9",
                "title": "Unrelated",
                "body": "",
                "repository": repository_node(),
                "author": null
            }
        ]}}})))
        .mount(&server)
        .await;

    let threads = client(&server)
        .search_threads(ThreadKind::Issue, "guild-bot", "")
        .await
        .unwrap();

    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].id, "I_1");
    assert!(threads[0].category_id.is_none());
    assert!(threads[0].author_login.is_none());
}

#[tokio::test]
async fn search_without_nodes_yields_no_threads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"search": {}}})))
        .mount(&server)
        .await;

    let threads = client(&server)
        .search_threads(ThreadKind::Discussion, "guild-bot", "the-guild-org/crisp-chats")
        .await
        .unwrap();

    assert!(threads.is_empty());
}

#[tokio::test]
async fn repository_without_category_nodes_has_no_categories() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"repository": {
            "id": "R_repo",
            "discussionCategories": {}
        }}})))
        .mount(&server)
        .await;

    let info = client(&server)
        .resolve_repository("org", "repo")
        .await
        .unwrap()
        .expect("repository exists");

    assert_eq!(info.id, "R_repo");
    assert!(info.discussion_categories.is_empty());
}

#[tokio::test]
async fn resolve_repository_maps_categories() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("followRenames: true"))
        .and(body_partial_json(json!({"variables": {"owner": "org", "name": "repo"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"repository": {
            "id": "R_repo",
            "discussionCategories": {"nodes": [
                {"id": "DC_general", "name": "General"},
                {"id": "DC_faq", "name": "FAQ"}
            ]}
        }}})))
        .mount(&server)
        .await;

    let info = client(&server)
        .resolve_repository("org", "repo")
        .await
        .unwrap()
        .expect("repository exists");

    assert_eq!(info.id, "R_repo");
    let names: Vec<_> = info.discussion_categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["General", "FAQ"]);
}

#[tokio::test]
async fn missing_repository_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"repository": null},
            "errors": [{
                "type": "NOT_FOUND",
                "path": ["repository"],
                "message": "Could not resolve to a Repository with the name 'org/missing'."
            }]
        })))
        .mount(&server)
        .await;

    let info = client(&server).resolve_repository("org", "missing").await.unwrap();
    assert!(info.is_none());
}

#[tokio::test]
async fn graphql_errors_fail_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{"type": "FORBIDDEN", "message": "Resource not accessible by integration"}]
        })))
        .mount(&server)
        .await;

    let err = client(&server).delete_discussion("D_1").await.unwrap_err();
    assert!(err.to_string().contains("Resource not accessible by integration"));

    let err = client(&server).resolve_repository("org", "repo").await.unwrap_err();
    assert!(err.to_string().contains("Resource not accessible"));
}

#[tokio::test]
async fn http_errors_fail_the_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
        .mount(&server)
        .await;

    let err = client(&server).current_user_login().await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn create_discussion_sends_ids_and_returns_the_new_thread() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("createDiscussion"))
        .and(body_partial_json(json!({"variables": {
            "repoId": "R_repo",
            "categoryId": "DC_faq",
            "title": "Setup Guide",
            "body": "<!-- page-1 -->\nbody"
        }})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"createDiscussion": {
            "discussion": {"id": "D_new", "url": "https://github.com/org/repo/discussions/7"}
        }}})))
        .expect(1)
        .mount(&server)
        .await;

    let created = client(&server)
        .create_discussion("R_repo", "DC_faq", "Setup Guide", "<!-- page-1 -->\nbody")
        .await
        .unwrap();

    assert_eq!(created.id, "D_new");
    assert_eq!(
        created.url.as_deref(),
        Some("https://github.com/org/repo/discussions/7")
    );
}

#[tokio::test]
async fn issue_mutations_use_their_own_input_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("issueId: $id"))
        .and(body_partial_json(json!({"variables": {"id": "I_1"}})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"deleteIssue": {"__typename": "DeleteIssuePayload"}}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("updateIssue(input: { id: $id"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"updateIssue": {"__typename": "UpdateIssuePayload"}}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let github = client(&server);
    github.delete_issue("I_1").await.unwrap();
    github.update_issue("I_2", "Title", "Body").await.unwrap();
}

#[test]
fn search_query_excludes_the_housekeeping_repository() {
    assert_eq!(
        search_query("guild-bot", "the-guild-org/crisp-chats"),
        "author:guild-bot -repo:the-guild-org/crisp-chats"
    );
    assert_eq!(search_query("guild-bot", ""), "author:guild-bot");
}
