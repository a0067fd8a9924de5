//! HTTP trigger surface and the scheduled loop.
//!
//! Both triggers funnel into [`run_once`]:
//! - `POST /sync` (on-demand) runs only when `ENABLE_FETCH` is set; it
//!   answers `200 {"plan": ...}`, `500 {"error": ...}`, or `403` when
//!   disabled.
//! - [`run_scheduled`] runs on a fixed interval and only logs the outcome.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use notion_sync_core::config::SyncConfig;
use notion_sync_core::contract::{DocumentSource, ThreadHost};
use notion_sync_core::error::SyncError;
use notion_sync_core::synchronise::{synchronise, SynchroniseReport};
use serde_json::{json, Value};
use tokio::time::{interval, MissedTickBehavior};

use crate::load_config::AppConfig;

pub struct AppState<S: ?Sized, H: ?Sized> {
    pub source: Arc<S>,
    pub host: Arc<H>,
    pub config: Arc<SyncConfig>,
    pub enable_fetch: bool,
}

impl<S: ?Sized, H: ?Sized> Clone for AppState<S, H> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            host: Arc::clone(&self.host),
            config: Arc::clone(&self.config),
            enable_fetch: self.enable_fetch,
        }
    }
}

pub fn router<S, H>(state: AppState<S, H>) -> Router
where
    S: DocumentSource + 'static,
    H: ThreadHost + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/sync", post(trigger_sync::<S, H>))
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "notion-sync"
    }))
}

async fn trigger_sync<S, H>(State(state): State<AppState<S, H>>) -> (StatusCode, Json<Value>)
where
    S: DocumentSource + 'static,
    H: ThreadHost + 'static,
{
    if !state.enable_fetch {
        tracing::warn!(trigger = "on_demand", "Rejected sync request: on-demand trigger disabled");
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "error": "On-demand sync is disabled; set ENABLE_FETCH to enable it" })),
        );
    }

    match run_once(&state, "on_demand").await {
        Ok(report) => (StatusCode::OK, Json(json!({ "plan": report.plan }))),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        ),
    }
}

/// One synchronisation run, logged with the trigger that started it.
pub async fn run_once<S, H>(
    state: &AppState<S, H>,
    trigger: &'static str,
) -> Result<SynchroniseReport, SyncError>
where
    S: DocumentSource + ?Sized,
    H: ThreadHost + ?Sized,
{
    tracing::info!(trigger, "Synchronisation triggered");
    let result = synchronise(&state.config, state.source.as_ref(), state.host.as_ref()).await;
    match &result {
        Ok(report) => tracing::info!(
            trigger,
            planned = report.plan.len(),
            applied = report.execution.applied,
            skipped = report.execution.skipped,
            "Synchronisation succeeded"
        ),
        Err(e) => tracing::error!(trigger, error = %e, "Synchronisation failed"),
    }
    result
}

/// Runs forever: once immediately, then every `every`. Failures are logged
/// and the loop carries on.
pub async fn run_scheduled<S, H>(state: AppState<S, H>, every: Duration)
where
    S: DocumentSource + ?Sized,
    H: ThreadHost + ?Sized,
{
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        let _ = run_once(&state, "scheduled").await;
    }
}

/// Serves the HTTP triggers on `listen_addr`, plus the scheduled loop when
/// an interval is configured.
pub async fn serve(config: AppConfig) -> Result<()> {
    let state = AppState {
        source: Arc::new(config.notion_client()),
        host: Arc::new(config.github_client()),
        config: Arc::new(config.sync_config()),
        enable_fetch: config.enable_fetch,
    };

    if let Some(secs) = config.schedule_interval_secs {
        tracing::info!(interval_secs = secs, "Starting scheduled synchronisation");
        tokio::spawn(run_scheduled(state.clone(), Duration::from_secs(secs)));
    }

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, enable_fetch = config.enable_fetch, "Starting trigger server");

    axum::serve(listener, router(state))
        .await
        .context("Trigger server stopped")?;
    Ok(())
}
