use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::render::{compose_header_note, DEFAULT_BRANDING};

/// Repository holding the bot's own housekeeping threads; never managed.
pub const DEFAULT_EXCLUDED_REPOSITORY: &str = "the-guild-org/crisp-chats";

/// Settings of one synchronisation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Provenance note written under the signature of every body.
    pub header_note: String,
    /// `owner/name` excluded from the existing-thread search.
    pub excluded_repository: String,
    /// Build and log the plan but skip every mutation.
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            header_note: compose_header_note(DEFAULT_BRANDING),
            excluded_repository: DEFAULT_EXCLUDED_REPOSITORY.to_string(),
            dry_run: false,
        }
    }
}

impl SyncConfig {
    pub fn trace_loaded(&self) {
        info!(
            excluded_repository = %self.excluded_repository,
            dry_run = self.dry_run,
            "Loaded SyncConfig"
        );
        debug!(?self, "SyncConfig loaded (full debug)");
    }
}
