//! Service gateway core.
//!
//! This module provides:
//! - Hot-reloaded service configuration snapshots
//! - Outbound transport to external model services
//! - The dispatcher with deterministic baseline fallback
//! - Per-service metrics and rolling health classification

pub mod dispatcher;
mod health;
mod metrics;
mod outcome;
mod snapshot;
mod store;
pub mod transport;

pub use dispatcher::{DispatchResponse, Dispatcher, ResponseMeta, ResponseSource};
pub use health::{classify, HealthAssessment, HealthStatus};
pub use metrics::{LastError, LatencySummary, MetricsAggregator, Sample, ServiceMetrics};
pub use outcome::{DispatchOutcome, FailureKind, OutcomeKind};
pub use snapshot::{ConfigError, ConfigSnapshot, ServiceDescriptor, DEFAULT_TIMEOUT_MS};
pub use store::{watch, ConfigStore, ReloadFailure};
pub use transport::{HttpTransport, ServiceTransport, TransportError};
