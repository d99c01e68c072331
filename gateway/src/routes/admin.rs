//! Admin API routes.
//!
//! Provides:
//! - Current configuration and last reload status (`/admin/config`)
//! - Forced reload of the services document (`/admin/reload`)
//! - Per-service health reports (`/admin/health`, `/admin/health/:service`)
//! - Per-service metrics snapshots (`/admin/metrics`, `/admin/metrics/:service`)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use jobmatch_common::ServiceKind;
use serde::Serialize;

use crate::error::{ApiError, Result};
use crate::gateway::{ConfigSnapshot, HealthAssessment, ReloadFailure, ServiceMetrics};
use crate::AppState;

/// Response for /admin/config.
#[derive(Debug, Serialize)]
pub struct ConfigReport {
    pub source: String,
    pub snapshot: Arc<ConfigSnapshot>,
    pub last_reload_error: Option<ReloadFailure>,
}

/// Response for a successful /admin/reload.
#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: &'static str,
    pub snapshot: Arc<ConfigSnapshot>,
}

/// Health of one service plus the routing it is judged against.
#[derive(Debug, Serialize)]
pub struct ServiceHealthReport {
    pub service: ServiceKind,
    pub endpoint: Option<String>,
    pub enabled: bool,
    pub timeout_ms: Option<u64>,
    #[serde(flatten)]
    pub assessment: HealthAssessment,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub config_sequence: u64,
    pub services: Vec<ServiceHealthReport>,
}

#[derive(Debug, Serialize)]
pub struct MetricsReport {
    pub services: Vec<ServiceMetrics>,
}

pub(crate) fn service_health(state: &AppState, service: ServiceKind) -> ServiceHealthReport {
    let snapshot = state.config_store.current();
    let descriptor = snapshot.get(service);
    let timeout = descriptor.filter(|d| d.enabled()).map(|d| d.timeout());

    ServiceHealthReport {
        service,
        endpoint: descriptor
            .map(|d| d.endpoint().to_string())
            .filter(|e| !e.is_empty()),
        enabled: descriptor.is_some_and(|d| d.enabled()),
        timeout_ms: descriptor.map(|d| d.timeout_ms()),
        assessment: state.metrics.assess(service, timeout),
    }
}

pub(crate) fn metrics_report(state: &AppState) -> MetricsReport {
    MetricsReport {
        services: ServiceKind::ALL
            .into_iter()
            .map(|kind| state.metrics.snapshot(kind))
            .collect(),
    }
}

pub(crate) fn config_report(state: &AppState) -> ConfigReport {
    ConfigReport {
        source: state.config_store.source().display().to_string(),
        snapshot: state.config_store.current(),
        last_reload_error: state.config_store.last_error(),
    }
}

fn parse_service(name: &str) -> Result<ServiceKind> {
    name.parse()
        .map_err(|_| ApiError::UnknownService(name.to_string()))
}

/// GET /admin/config
async fn get_config(State(state): State<Arc<AppState>>) -> Json<ConfigReport> {
    Json(config_report(&state))
}

/// POST /admin/reload - Re-read the services document now.
async fn reload(State(state): State<Arc<AppState>>) -> Result<Json<ReloadResponse>> {
    let store = Arc::clone(&state.config_store);
    let snapshot = tokio::task::spawn_blocking(move || store.reload())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(ReloadResponse {
        status: "reloaded",
        snapshot,
    }))
}

/// GET /admin/health
async fn all_health(State(state): State<Arc<AppState>>) -> Json<HealthReport> {
    Json(HealthReport {
        config_sequence: state.config_store.current().sequence(),
        services: ServiceKind::ALL
            .into_iter()
            .map(|kind| service_health(&state, kind))
            .collect(),
    })
}

/// GET /admin/health/:service
async fn one_health(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
) -> Result<Json<ServiceHealthReport>> {
    let kind = parse_service(&service)?;
    Ok(Json(service_health(&state, kind)))
}

/// GET /admin/metrics
async fn all_metrics(State(state): State<Arc<AppState>>) -> Json<MetricsReport> {
    Json(metrics_report(&state))
}

/// GET /admin/metrics/:service
async fn one_metrics(
    State(state): State<Arc<AppState>>,
    Path(service): Path<String>,
) -> Result<Json<ServiceMetrics>> {
    let kind = parse_service(&service)?;
    Ok(Json(state.metrics.snapshot(kind)))
}

/// Routes mounted under `/admin`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/config", get(get_config))
        .route("/reload", post(reload))
        .route("/reload-config", post(reload))
        .route("/health", get(all_health))
        .route("/health/:service", get(one_health))
        .route("/metrics", get(all_metrics))
        .route("/metrics/:service", get(one_metrics))
        .with_state(state)
}
