//! Routing directives.
//!
//! A page opts into publishing by starting with a block whose text reads
//!
//! ```text
//! /github-public <owner/name> [issue | discussion [<category>]]
//! ```
//!
//! Pages written before the kind token existed used
//! `/github-public <owner/name> [<category>]`; any token other than `issue` or
//! `discussion` in the kind position is still read as a discussion category.

use serde::Serialize;

use crate::contract::Block;

pub const DECLARATION: &str = "/github-public";
pub const DEFAULT_CATEGORY: &str = "General";

const KIND_ISSUE: &str = "issue";
const KIND_DISCUSSION: &str = "discussion";

/// Where and how a page should be published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Directive {
    Issue {
        repo: String,
    },
    Discussion {
        repo: String,
        #[serde(rename = "categoryName")]
        category_name: String,
    },
}

impl Directive {
    pub fn repo(&self) -> &str {
        match self {
            Directive::Issue { repo } | Directive::Discussion { repo, .. } => repo,
        }
    }
}

/// Classifies a page by its first block. `None` means the page must not be
/// published (and any thread previously created for it is stale).
pub fn classify(first_block: Option<&Block>) -> Option<Directive> {
    let parent = first_block?.parent.trim();
    if parent.is_empty() {
        return None;
    }

    let mut tokens = parent.split_whitespace();
    if tokens.next() != Some(DECLARATION) {
        return None;
    }
    let repo = tokens.next().unwrap_or_default().to_string();
    let kind = tokens.next().unwrap_or_default();
    let category = tokens.next().unwrap_or_default();

    let directive = match kind {
        KIND_ISSUE => Directive::Issue { repo },
        KIND_DISCUSSION => Directive::Discussion {
            repo,
            category_name: non_empty_or_default(category),
        },
        legacy => Directive::Discussion {
            repo,
            category_name: non_empty_or_default(legacy),
        },
    };
    Some(directive)
}

fn non_empty_or_default(token: &str) -> String {
    if token.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        token.to_string()
    }
}
