//! # notion: Notion REST client implementing [`DocumentSource`]
//!
//! - `list_documents` pages through `POST /v1/search`, restricted to page
//!   objects and sorted by last edit, newest first. Archived and trashed pages
//!   are dropped, and titles are parsed here, once, into [`DocumentTitle`].
//! - `render_document` walks `GET /v1/blocks/{id}/children` down to
//!   [`MAX_BLOCK_DEPTH`] levels and renders every block to its own markdown
//!   line, stored in [`Block::parent`].
//!
//! Authentication is a bearer integration token. All HTTP and decoding
//! failures are returned as [`BoxError`].

use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info};

use crate::contract::{Block, BoxError, Document, DocumentSource, DocumentTitle};

pub const NOTION_API_BASE: &str = "https://api.notion.com";
pub const NOTION_VERSION: &str = "2022-06-28";
pub const DEFAULT_PAGE_SIZE: u32 = 100;
/// Top-level blocks plus one level of children.
pub const MAX_BLOCK_DEPTH: usize = 2;

pub struct NotionClient {
    http: Client,
    base_url: String,
    token: String,
    page_size: u32,
}

impl NotionClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: NOTION_API_BASE.to_string(),
            token: token.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Points the client at another server (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, 100);
        self
    }

    async fn search_page(&self, cursor: Option<&str>) -> Result<Paginated<RawPage>, BoxError> {
        let url = format!("{}/v1/search", self.base_url);
        let mut body = json!({
            "page_size": self.page_size,
            "filter": { "property": "object", "value": "page" },
            "sort": { "direction": "descending", "timestamp": "last_edited_time" },
        });
        if let Some(cursor) = cursor {
            body["start_cursor"] = Value::String(cursor.to_string());
        }

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await?;
        decode(response, &url).await
    }

    async fn block_children_page(
        &self,
        block_id: &str,
        cursor: Option<&str>,
    ) -> Result<Paginated<RawBlock>, BoxError> {
        let url = format!("{}/v1/blocks/{}/children", self.base_url, block_id);
        let mut query = vec![("page_size", "100".to_string())];
        if let Some(cursor) = cursor {
            query.push(("start_cursor", cursor.to_string()));
        }

        let response = self
            .http
            .get(&url)
            .query(&query)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await?;
        decode(response, &url).await
    }

    fn fetch_blocks<'a>(
        &'a self,
        block_id: &'a str,
        depth: usize,
    ) -> BoxFuture<'a, Result<Vec<Block>, BoxError>> {
        async move {
            let mut raw_blocks = Vec::new();
            let mut cursor: Option<String> = None;
            loop {
                let page = self.block_children_page(block_id, cursor.as_deref()).await?;
                raw_blocks.extend(page.results);
                match page.next_cursor {
                    Some(next) if page.has_more => cursor = Some(next),
                    _ => break,
                }
            }

            let mut blocks = Vec::with_capacity(raw_blocks.len());
            for raw in raw_blocks {
                let children = if raw.expands_inline() && depth + 1 < MAX_BLOCK_DEPTH {
                    self.fetch_blocks(&raw.id, depth + 1).await?
                } else {
                    Vec::new()
                };
                blocks.push(raw.into_block().with_children(children));
            }
            Ok(blocks)
        }
        .boxed()
    }
}

#[async_trait::async_trait]
impl DocumentSource for NotionClient {
    async fn list_documents(&self) -> Result<Vec<Document>, BoxError> {
        let mut documents = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self.search_page(cursor.as_deref()).await?;
            documents.extend(page.results.into_iter().filter_map(RawPage::into_document));
            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }
        info!(count = documents.len(), "Listed shared Notion pages");
        Ok(documents)
    }

    async fn render_document(&self, document_id: &str) -> Result<Vec<Block>, BoxError> {
        let blocks = self.fetch_blocks(document_id, 0).await?;
        debug!(document_id, blocks = blocks.len(), "Rendered Notion page");
        Ok(blocks)
    }
}

async fn decode<T>(response: reqwest::Response, url: &str) -> Result<T, BoxError>
where
    T: for<'de> Deserialize<'de>,
{
    let status = response.status();
    if !status.is_success() {
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<Failed to decode response body>"));
        error!(status = %status, url = %url, "Notion API returned error. Response body: {text}");
        return Err(format!("Notion API error {status} for {url}: {text}").into());
    }
    Ok(response.json::<T>().await?)
}

#[derive(Debug, Deserialize)]
struct Paginated<T> {
    results: Vec<T>,
    #[serde(default)]
    has_more: bool,
    next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    id: String,
    #[serde(default)]
    object: String,
    url: Option<String>,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    in_trash: bool,
    #[serde(default)]
    properties: Map<String, Value>,
}

impl RawPage {
    fn into_document(self) -> Option<Document> {
        if self.object != "page" || self.archived || self.in_trash {
            return None;
        }
        Some(Document {
            title: extract_title(&self.properties),
            id: self.id,
            url: self.url,
        })
    }
}

/// Reads the title from a page's `title` (or `Title`) property: the first
/// rich-text run's plain text. Anything missing or empty yields `None`.
pub fn extract_title(properties: &Map<String, Value>) -> Option<DocumentTitle> {
    let property = properties.get("title").or_else(|| properties.get("Title"))?;
    let first = property.get("title")?.as_array()?.first()?;
    DocumentTitle::parse(first.get("plain_text")?.as_str()?)
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    id: String,
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    has_children: bool,
    #[serde(flatten)]
    content: Map<String, Value>,
}

/// Blocks standing for separate pages; their children are never inlined.
const PAGE_LIKE_BLOCKS: [&str; 2] = ["child_page", "child_database"];

impl RawBlock {
    fn expands_inline(&self) -> bool {
        self.has_children && !PAGE_LIKE_BLOCKS.contains(&self.block_type.as_str())
    }

    fn into_block(self) -> Block {
        let payload = self.content.get(&self.block_type).cloned().unwrap_or(Value::Null);
        let parent = block_markdown(&self.block_type, &payload);
        Block::new(self.block_type, parent)
    }
}

#[derive(Debug, Default, Deserialize)]
struct RichText {
    #[serde(default)]
    plain_text: String,
    href: Option<String>,
    #[serde(default)]
    annotations: Annotations,
}

#[derive(Debug, Default, Deserialize)]
struct Annotations {
    #[serde(default)]
    bold: bool,
    #[serde(default)]
    italic: bool,
    #[serde(default)]
    strikethrough: bool,
    #[serde(default)]
    code: bool,
}

/// Renders a rich-text array (as found under `rich_text` or `caption`) to inline markdown.
pub fn rich_text_markdown(value: &Value) -> String {
    let runs: Vec<RichText> = serde_json::from_value(value.clone()).unwrap_or_default();
    runs.iter().map(render_run).collect()
}

fn render_run(run: &RichText) -> String {
    let mut text = run.plain_text.clone();
    if text.is_empty() {
        return text;
    }
    if run.annotations.code {
        text = format!("`{text}`");
    }
    if run.annotations.bold {
        text = format!("**{text}**");
    }
    if run.annotations.italic {
        text = format!("_{text}_");
    }
    if run.annotations.strikethrough {
        text = format!("~~{text}~~");
    }
    if let Some(href) = &run.href {
        text = format!("[{text}]({href})");
    }
    text
}

/// Markdown for a single block, children excluded. Unknown types render empty.
pub fn block_markdown(block_type: &str, payload: &Value) -> String {
    let text = || rich_text_markdown(&payload["rich_text"]);
    match block_type {
        "paragraph" | "toggle" => text(),
        "heading_1" => format!("# {}", text()),
        "heading_2" => format!("## {}", text()),
        "heading_3" => format!("### {}", text()),
        "bulleted_list_item" => format!("- {}", text()),
        "numbered_list_item" => format!("1. {}", text()),
        "to_do" => {
            let mark = if payload["checked"].as_bool().unwrap_or(false) {
                "x"
            } else {
                " "
            };
            format!("- [{mark}] {}", text())
        }
        "quote" => format!("> {}", text()),
        "callout" => match payload["icon"]["emoji"].as_str() {
            Some(emoji) => format!("> {emoji} {}", text()),
            None => format!("> {}", text()),
        },
        "code" => {
            let language = payload["language"].as_str().unwrap_or_default();
            let source: String = payload["rich_text"]
                .as_array()
                .map(|runs| {
                    runs.iter()
                        .filter_map(|run| run["plain_text"].as_str())
                        .collect()
                })
                .unwrap_or_default();
            format!("```{language}\n{source}\n```")
        }
        "divider" => "---".to_string(),
        "equation" => format!("$$ {} $$", payload["expression"].as_str().unwrap_or_default()),
        "image" => {
            let caption = rich_text_markdown(&payload["caption"]);
            format!("![{caption}]({})", file_url(payload))
        }
        "bookmark" | "embed" | "link_preview" => {
            let url = payload["url"].as_str().unwrap_or_default();
            let caption = rich_text_markdown(&payload["caption"]);
            let label = if caption.is_empty() { url.to_string() } else { caption };
            format!("[{label}]({url})")
        }
        "child_page" => format!("**{}**", payload["title"].as_str().unwrap_or_default()),
        _ => String::new(),
    }
}

fn file_url(payload: &Value) -> &str {
    let kind = payload["type"].as_str().unwrap_or("external");
    payload[kind]["url"].as_str().unwrap_or_default()
}
