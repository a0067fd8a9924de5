//! Identity codec tying a thread body back to the page it was created from.
//!
//! Every body this system writes starts with an HTML comment carrying the
//! page id. HTML comments are invisible on GitHub, and matching is a plain
//! byte prefix check on the body.
//!
//! `&` and `>` inside an id are escaped so the encoded id never contains the
//! closing delimiter. That keeps the encoding injective and guarantees no
//! signature is a prefix of another.

const OPEN: &str = "<!-- ";
const CLOSE: &str = " -->";

pub fn compose_signature(document_id: &str) -> String {
    let mut signature = String::with_capacity(OPEN.len() + document_id.len() + CLOSE.len());
    signature.push_str(OPEN);
    for ch in document_id.chars() {
        match ch {
            '&' => signature.push_str("&amp;"),
            '>' => signature.push_str("&gt;"),
            other => signature.push(other),
        }
    }
    signature.push_str(CLOSE);
    signature
}

/// True when `body` was written for the document owning `signature`.
pub fn carries_signature(body: &str, signature: &str) -> bool {
    body.starts_with(signature)
}
