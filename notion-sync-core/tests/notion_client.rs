//! Notion client against a wiremock server standing in for api.notion.com.

use notion_sync_core::contract::DocumentSource;
use notion_sync_core::notion::{block_markdown, extract_title, NotionClient, NOTION_VERSION};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> NotionClient {
    NotionClient::new("secret_token").with_base_url(server.uri())
}

fn page(id: &str, title: Option<&str>) -> serde_json::Value {
    let properties = match title {
        Some(t) => json!({"title": {"id": "title", "type": "title", "title": [{"plain_text": t}]}}),
        None => json!({}),
    };
    json!({
        "object": "page",
        "id": id,
        "url": format!("https://www.notion.so/{id}"),
        "archived": false,
        "properties": properties,
    })
}

fn paragraph(id: &str, text: &str, has_children: bool) -> serde_json::Value {
    json!({
        "object": "block",
        "id": id,
        "type": "paragraph",
        "has_children": has_children,
        "paragraph": {"rich_text": [{"plain_text": text, "annotations": {}}]},
    })
}

#[tokio::test]
async fn list_documents_follows_cursors_and_parses_titles() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/search"))
        .and(header("Notion-Version", NOTION_VERSION))
        .and(header("Authorization", "Bearer secret_token"))
        .and(body_partial_json(json!({"start_cursor": "cursor-2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [page("page-3", Some("Third"))],
            "has_more": false,
            "next_cursor": null,
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/search"))
        .and(body_partial_json(json!({"filter": {"property": "object", "value": "page"}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                page("page-1", Some("First")),
                page("page-2", None),
                {"object": "page", "id": "page-archived", "archived": true, "properties": {}},
                {"object": "database", "id": "db-1", "properties": {}},
            ],
            "has_more": true,
            "next_cursor": "cursor-2",
        })))
        .mount(&server)
        .await;

    let documents = client(&server).list_documents().await.expect("search should succeed");

    let ids: Vec<_> = documents.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, ["page-1", "page-2", "page-3"]);
    assert_eq!(documents[0].title.as_ref().map(|t| t.as_str()), Some("First"));
    assert!(documents[1].title.is_none());
    assert_eq!(documents[2].url.as_deref(), Some("https://www.notion.so/page-3"));
}

#[tokio::test]
async fn render_document_fetches_one_level_of_children() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/blocks/page-1/children"))
        .and(query_param("page_size", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                paragraph("b-1", "/github-public org/repo issue", false),
                paragraph("b-2", "Parent", true),
            ],
            "has_more": false,
            "next_cursor": null,
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/blocks/b-2/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [paragraph("b-3", "Child", true)],
            "has_more": false,
            "next_cursor": null,
        })))
        .mount(&server)
        .await;

    // Grandchildren are beyond the depth limit and must not be requested.
    Mock::given(method("GET"))
        .and(path("/v1/blocks/b-3/children"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let blocks = client(&server)
        .render_document("page-1")
        .await
        .expect("render should succeed");

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].parent, "/github-public org/repo issue");
    assert_eq!(blocks[1].children.len(), 1);
    assert_eq!(blocks[1].children[0].parent, "Child");
    assert!(blocks[1].children[0].children.is_empty());
}

#[tokio::test]
async fn sub_pages_render_as_their_title_without_their_content() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/blocks/page-1/children"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                paragraph("b-1", "/github-public org/repo issue", false),
                {
                    "object": "block",
                    "id": "sub-page",
                    "type": "child_page",
                    "has_children": true,
                    "child_page": {"title": "Appendix"},
                },
            ],
            "has_more": false,
            "next_cursor": null,
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/blocks/sub-page/children"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let blocks = client(&server)
        .render_document("page-1")
        .await
        .expect("render should succeed");

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1].block_type, "child_page");
    assert_eq!(blocks[1].parent, "**Appendix**");
    assert!(blocks[1].children.is_empty());
}

#[tokio::test]
async fn api_errors_are_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"code":"unauthorized"}"#))
        .mount(&server)
        .await;

    let err = client(&server).list_documents().await.unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[test]
fn title_comes_from_title_or_capitalised_title_property() {
    let lower = json!({"title": {"title": [{"plain_text": "Lower"}]}});
    let upper = json!({"Title": {"title": [{"plain_text": "Upper"}]}});
    let empty = json!({"title": {"title": []}});
    let blank = json!({"title": {"title": [{"plain_text": "  "}]}});

    let parse = |v: serde_json::Value| extract_title(v.as_object().unwrap()).map(|t| t.to_string());
    assert_eq!(parse(lower).as_deref(), Some("Lower"));
    assert_eq!(parse(upper).as_deref(), Some("Upper"));
    assert_eq!(parse(empty), None);
    assert_eq!(parse(blank), None);
    assert_eq!(parse(json!({"Name": {"title": [{"plain_text": "x"}]}})), None);
}

#[test]
fn blocks_render_to_markdown() {
    let rich = |text: &str| json!({"rich_text": [{"plain_text": text, "annotations": {}}]});

    assert_eq!(block_markdown("heading_2", &rich("Setup")), "## Setup");
    assert_eq!(block_markdown("bulleted_list_item", &rich("item")), "- item");
    assert_eq!(block_markdown("numbered_list_item", &rich("step")), "1. step");
    assert_eq!(block_markdown("quote", &rich("said")), "> said");
    assert_eq!(block_markdown("divider", &json!({})), "---");
    assert_eq!(
        block_markdown(
            "to_do",
            &json!({"checked": true, "rich_text": [{"plain_text": "done"}]})
        ),
        "- [x] done"
    );
    assert_eq!(
        block_markdown(
            "code",
            &json!({"language": "rust", "rich_text": [{"plain_text": "fn main() {}"}]})
        ),
        "```rust\nfn main() {}\n```"
    );
    assert_eq!(
        block_markdown(
            "image",
            &json!({"type": "external", "external": {"url": "https://img/x.png"}, "caption": []})
        ),
        "![](https://img/x.png)"
    );
    assert_eq!(block_markdown("unsupported", &json!({})), "");
}

#[test]
fn rich_text_annotations_and_links_are_rendered() {
    let payload = json!({"rich_text": [
        {"plain_text": "bold", "annotations": {"bold": true}},
        {"plain_text": " and ", "annotations": {}},
        {"plain_text": "code", "annotations": {"code": true}},
        {"plain_text": " ", "annotations": {}},
        {"plain_text": "link", "href": "https://the-guild.dev", "annotations": {"italic": true}},
    ]});
    assert_eq!(
        block_markdown("paragraph", &payload),
        "**bold** and `code` [_link_](https://the-guild.dev)"
    );
}
