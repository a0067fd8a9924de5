//! Repository and discussion-category resolution, memoized for one run.
//!
//! A [`RepositoryResolver`] is created by each plan build and dropped with it,
//! so repository data never outlives the run that fetched it.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, info};

use crate::contract::{DiscussionCategory, RepositoryInfo, ThreadHost};
use crate::error::{Result, SyncError};

pub struct RepositoryResolver<'h, H: ?Sized> {
    host: &'h H,
    cache: Mutex<HashMap<String, RepositoryInfo>>,
}

impl<'h, H> RepositoryResolver<'h, H>
where
    H: ThreadHost + ?Sized,
{
    pub fn new(host: &'h H) -> Self {
        Self {
            host,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves an `owner/name` reference as written in a routing directive.
    pub async fn resolve_reference(&self, repo: &str) -> Result<RepositoryInfo> {
        let (owner, name) = split_repository(repo)?;
        self.resolve(owner, name).await
    }

    /// Looks up `owner/name`, hitting the host at most once per key unless
    /// two documents race on the same cold key (both fetches then store the
    /// same value).
    pub async fn resolve(&self, owner: &str, name: &str) -> Result<RepositoryInfo> {
        let key = format!("{owner}/{name}");
        if let Some(hit) = self.cached(&key) {
            debug!(repository = %key, "Repository resolved from cache");
            return Ok(hit);
        }

        let info = self
            .host
            .resolve_repository(owner, name)
            .await
            .map_err(SyncError::Host)?
            .ok_or_else(|| SyncError::RepositoryNotFound(key.clone()))?;
        info!(
            repository = %key,
            repository_id = %info.id,
            categories = info.discussion_categories.len(),
            "Resolved repository"
        );

        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(key)
            .or_insert_with(|| info.clone());
        Ok(info)
    }

    fn cached(&self, key: &str) -> Option<RepositoryInfo> {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }
}

/// Splits `owner/name`; both halves must be non-empty.
pub fn split_repository(repo: &str) -> Result<(&str, &str)> {
    match repo.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            Ok((owner, name))
        }
        _ => Err(SyncError::InvalidRepository(repo.to_string())),
    }
}

/// Category lookup is case-insensitive.
pub fn find_category<'a>(info: &'a RepositoryInfo, name: &str) -> Option<&'a DiscussionCategory> {
    info.discussion_categories
        .iter()
        .find(|category| category.name.to_lowercase() == name.to_lowercase())
}
