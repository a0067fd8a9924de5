use thiserror::Error;

use crate::contract::BoxError;

/// Failures that abort a synchronisation run.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("document source error: {0}")]
    Source(#[source] BoxError),

    #[error("thread host error: {0}")]
    Host(#[source] BoxError),

    #[error("repository reference {0:?} is not of the form owner/name")]
    InvalidRepository(String),

    #[error("repository {0} not found or not accessible")]
    RepositoryNotFound(String),

    #[error("Category {category} not found in repo {repository}")]
    CategoryNotFound { category: String, repository: String },

    #[error("{failed} of {total} mutations failed; first failure: {first}")]
    MutationsFailed {
        failed: usize,
        total: usize,
        first: String,
    },
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
