/// `load_config` module: merges an optional static YAML file with secrets and
/// flags taken from the environment into one [`AppConfig`].
///
/// # Sources
/// - YAML (optional, no secrets): `note_branding`, `excluded_repository`,
///   `page_size`, `listen_addr`, `schedule_interval_secs`, and the API base
///   URLs `notion_api_url` / `github_api_url`.
/// - Environment: `NOTION_TOKEN` and `GH_BOT_TOKEN` (required), `DRY_RUN`,
///   `ENABLE_FETCH`, `NOTE_BRANDING` (overrides the file).
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary.
use anyhow::{anyhow, Result};
use notion_sync_core::config::{SyncConfig, DEFAULT_EXCLUDED_REPOSITORY};
use notion_sync_core::notion::{NotionClient, DEFAULT_PAGE_SIZE};
use notion_sync_core::render::{compose_header_note, DEFAULT_BRANDING};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use crate::github::GitHubClient;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

/// A credential that never shows up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    note_branding: Option<String>,
    excluded_repository: Option<String>,
    page_size: Option<u32>,
    listen_addr: Option<String>,
    schedule_interval_secs: Option<u64>,
    notion_api_url: Option<String>,
    github_api_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub notion_token: Secret,
    pub github_token: Secret,
    pub note_branding: String,
    pub excluded_repository: String,
    pub page_size: u32,
    pub listen_addr: String,
    pub schedule_interval_secs: Option<u64>,
    pub notion_api_url: Option<String>,
    pub github_api_url: Option<String>,
    pub dry_run: bool,
    pub enable_fetch: bool,
}

impl AppConfig {
    /// Settings handed to every synchronisation run.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            header_note: compose_header_note(&self.note_branding),
            excluded_repository: self.excluded_repository.clone(),
            dry_run: self.dry_run,
        }
    }

    pub fn notion_client(&self) -> NotionClient {
        let client = NotionClient::new(self.notion_token.expose()).with_page_size(self.page_size);
        match &self.notion_api_url {
            Some(url) => client.with_base_url(url.as_str()),
            None => client,
        }
    }

    pub fn github_client(&self) -> GitHubClient {
        let client = GitHubClient::new(self.github_token.expose());
        match &self.github_api_url {
            Some(url) => client.with_base_url(url),
            None => client,
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            note_branding = %self.note_branding,
            excluded_repository = %self.excluded_repository,
            page_size = self.page_size,
            listen_addr = %self.listen_addr,
            schedule_interval_secs = ?self.schedule_interval_secs,
            dry_run = self.dry_run,
            enable_fetch = self.enable_fetch,
            "Loaded AppConfig"
        );
        debug!(config = ?self, "AppConfig loaded (full debug, secrets redacted)");
    }
}

/// `DRY_RUN=1`, `ENABLE_FETCH=true` and the like. Unset, empty and
/// `0`/`false`/`no`/`off` (any case) are false.
pub fn parse_flag(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"),
    }
}

fn required_env(name: &str) -> Result<Secret> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(Secret::new(value)),
        _ => {
            error!(variable = name, "Required environment variable missing");
            Err(anyhow!("{name} must be set in the environment"))
        }
    }
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Loads the optional YAML file at `path` and completes it from the environment.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let file = match path {
        Some(path) => read_file_config(path)?,
        None => {
            info!("No config file given, using defaults and environment");
            FileConfig::default()
        }
    };

    let notion_token = required_env("NOTION_TOKEN")?;
    let github_token = required_env("GH_BOT_TOKEN")?;

    let note_branding = optional_env("NOTE_BRANDING")
        .or(file.note_branding)
        .unwrap_or_else(|| DEFAULT_BRANDING.to_string());

    Ok(AppConfig {
        notion_token,
        github_token,
        note_branding,
        excluded_repository: file
            .excluded_repository
            .unwrap_or_else(|| DEFAULT_EXCLUDED_REPOSITORY.to_string()),
        page_size: file.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        listen_addr: file
            .listen_addr
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
        schedule_interval_secs: file.schedule_interval_secs.filter(|secs| *secs > 0),
        notion_api_url: file.notion_api_url,
        github_api_url: file.github_api_url,
        dry_run: parse_flag(env::var("DRY_RUN").ok().as_deref()),
        enable_fetch: parse_flag(env::var("ENABLE_FETCH").ok().as_deref()),
    })
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    info!(config_path = ?path, "Loading configuration from file");
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to read config file");
        anyhow!("Failed to read config file {:?}: {}", path, e)
    })?;

    // An empty file is a valid, all-default config.
    if content.trim().is_empty() {
        return Ok(FileConfig::default());
    }

    serde_yaml::from_str(&content).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
        anyhow!("Failed to parse config YAML in {}: {e}", path.display())
    })
}
