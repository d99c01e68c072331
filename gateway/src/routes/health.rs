use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use jobmatch_common::ServiceKind;
use serde::Serialize;

use super::admin::{config_report, metrics_report, service_health, ConfigReport, MetricsReport};
use crate::gateway::HealthStatus;
use crate::AppState;

#[derive(Serialize)]
struct IndexResponse {
    name: &'static str,
    version: &'static str,
    routes: BTreeMap<ServiceKind, String>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    config_sequence: u64,
    services: BTreeMap<ServiceKind, HealthStatus>,
}

async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        name: "JobMatch Service Gateway",
        version: env!("CARGO_PKG_VERSION"),
        routes: ServiceKind::ALL
            .into_iter()
            .map(|kind| (kind, format!("/api/{}", kind.route_alias())))
            .collect(),
    })
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        config_sequence: state.config_store.current().sequence(),
        services: ServiceKind::ALL
            .into_iter()
            .map(|kind| (kind, service_health(&state, kind).assessment.status))
            .collect(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Json<MetricsReport> {
    Json(metrics_report(&state))
}

async fn config(State(state): State<Arc<AppState>>) -> Json<ConfigReport> {
    Json(config_report(&state))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/config", get(config))
        .with_state(state)
}
