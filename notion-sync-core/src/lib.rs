#![doc = "notion-sync-core: reconciliation engine for notion-sync."]

//! This crate holds everything needed to mirror Notion pages into GitHub
//! discussions and issues, apart from the GitHub transport and the trigger
//! surfaces, which live in the `notion-sync` binary crate.
//!
//! # Usage
//! Implement [`contract::DocumentSource`] and [`contract::ThreadHost`] (or use
//! [`notion::NotionClient`] for the former), then call
//! [`synchronise::synchronise`].

pub mod config;
pub mod contract;
pub mod error;
pub mod execute;
pub mod markdown;
pub mod matcher;
pub mod notion;
pub mod plan;
pub mod render;
pub mod resolver;
pub mod routing;
pub mod signature;
pub mod synchronise;
