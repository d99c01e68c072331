pub mod baseline;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod routes;
pub mod test_util;

pub use crate::config::{HealthPolicy, Settings};
pub use error::ApiError;
pub use gateway::{
    ConfigSnapshot, ConfigStore, DispatchResponse, Dispatcher, HealthStatus, HttpTransport,
    MetricsAggregator, ServiceTransport,
};

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState {
    pub settings: Settings,
    /// Hot-reloaded routing table.
    pub config_store: Arc<ConfigStore>,
    /// Per-service outcome counters and latency samples.
    pub metrics: Arc<MetricsAggregator>,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(
        settings: Settings,
        config_store: Arc<ConfigStore>,
        transport: Arc<dyn ServiceTransport>,
    ) -> Self {
        let metrics = Arc::new(MetricsAggregator::new(
            settings.metrics.sample_capacity,
            settings.health.clone(),
        ));
        let dispatcher = Dispatcher::new(
            Arc::clone(&config_store),
            transport,
            Arc::clone(&metrics),
        );
        Self {
            settings,
            config_store,
            metrics,
            dispatcher,
        }
    }
}

/// Build the full HTTP application.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health::router(state.clone()))
        .merge(routes::predict::router(state.clone()))
        .nest("/admin", routes::admin::router(state))
        .layer(middleware::from_fn(logging::request_logger))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
