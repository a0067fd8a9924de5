#![allow(dead_code)]

use notion_sync_core::contract::{
    Block, DiscussionCategory, Document, DocumentTitle, RepositoryInfo, RepositoryRef, Thread,
    ThreadKind,
};
use notion_sync_core::signature::compose_signature;

pub const HEADER_NOTE: &str = "\n> This page is synced automatically from Notion";

pub fn document(id: &str, title: &str) -> Document {
    Document {
        id: id.to_string(),
        title: DocumentTitle::parse(title),
        url: Some(format!("https://www.notion.so/{id}")),
    }
}

pub fn untitled_document(id: &str) -> Document {
    Document {
        id: id.to_string(),
        title: None,
        url: None,
    }
}

/// A page whose first block is `directive`, followed by some content.
pub fn page_blocks(directive: &str) -> Vec<Block> {
    vec![
        Block::new("paragraph", directive),
        Block::new("heading_1", "# Overview"),
        Block::new("paragraph", "Body text."),
    ]
}

pub fn repository(id: &str) -> RepositoryRef {
    RepositoryRef {
        id: id.to_string(),
        owner: "org".to_string(),
        name: "repo".to_string(),
    }
}

pub fn thread(kind: ThreadKind, id: &str, document_id: &str) -> Thread {
    Thread {
        id: id.to_string(),
        kind,
        title: format!("Old title of {document_id}"),
        body: format!("{}\nstale body", compose_signature(document_id)),
        repository: repository("R_repo"),
        author_login: Some("guild-bot".to_string()),
        category_id: match kind {
            ThreadKind::Discussion => Some("DC_general".to_string()),
            ThreadKind::Issue => None,
        },
    }
}

pub fn repo_info() -> RepositoryInfo {
    RepositoryInfo {
        id: "R_repo".to_string(),
        discussion_categories: vec![
            DiscussionCategory {
                id: "DC_general".to_string(),
                name: "General".to_string(),
            },
            DiscussionCategory {
                id: "DC_faq".to_string(),
                name: "FAQ".to_string(),
            },
            DiscussionCategory {
                id: "DC_announcements".to_string(),
                name: "Announcements".to_string(),
            },
        ],
    }
}
