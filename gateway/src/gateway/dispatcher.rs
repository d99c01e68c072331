//! Routes a typed request to its external service, falling back to the
//! baseline on any failure.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use jobmatch_common::{ServiceKind, ServiceRequest, ServiceResponse};
use serde::Serialize;
use uuid::Uuid;

use super::health::as_millis;
use super::metrics::MetricsAggregator;
use super::outcome::{DispatchOutcome, FailureKind, OutcomeKind};
use super::snapshot::ServiceDescriptor;
use super::store::ConfigStore;
use super::transport::ServiceTransport;
use crate::baseline;

/// Computes a local answer for a request.
pub type BaselineFn = fn(&ServiceRequest) -> ServiceResponse;

/// Where the payload came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    External,
    Fallback,
}

/// Provenance details returned alongside every payload.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMeta {
    pub request_id: Uuid,
    pub source: ResponseSource,
    /// `external_success` or `fallback_success`.
    pub outcome: OutcomeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub latency_ms: f64,
    pub config_sequence: u64,
}

/// A payload tagged with its provenance.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResponse {
    #[serde(flatten)]
    pub payload: ServiceResponse,
    pub baseline: bool,
    #[serde(rename = "_meta")]
    pub meta: ResponseMeta,
}

/// Makes at most one external attempt per request and always answers.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<ConfigStore>,
    transport: Arc<dyn ServiceTransport>,
    metrics: Arc<MetricsAggregator>,
    baseline: BaselineFn,
}

impl Dispatcher {
    pub fn new(
        store: Arc<ConfigStore>,
        transport: Arc<dyn ServiceTransport>,
        metrics: Arc<MetricsAggregator>,
    ) -> Self {
        Self {
            store,
            transport,
            metrics,
            baseline: baseline::run,
        }
    }

    /// Replace the local fallback computation.
    pub fn with_baseline(mut self, baseline: BaselineFn) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn store(&self) -> &Arc<ConfigStore> {
        &self.store
    }

    pub fn metrics(&self) -> &Arc<MetricsAggregator> {
        &self.metrics
    }

    /// Dispatch `request`. Never fails; every call records exactly one outcome.
    ///
    /// The attempt runs on its own task, so its outcome is still recorded when
    /// the caller stops waiting.
    pub async fn dispatch(&self, request: ServiceRequest) -> DispatchResponse {
        let started = Instant::now();
        let kind = request.kind();
        let dispatcher = self.clone();
        match tokio::spawn(async move { dispatcher.attempt(request).await }).await {
            Ok(response) => response,
            Err(e) => {
                // Only a panicking transport gets here, before anything was recorded.
                tracing::error!(service = %kind, "Dispatch task failed: {}", e);
                let latency = started.elapsed();
                self.metrics.record_baseline_defect(kind);
                let payload = self.settle(
                    kind,
                    DispatchOutcome::FallbackSuccess {
                        latency,
                        payload: baseline::static_default(kind),
                    },
                );
                DispatchResponse {
                    payload,
                    baseline: true,
                    meta: ResponseMeta {
                        request_id: Uuid::new_v4(),
                        source: ResponseSource::Fallback,
                        outcome: OutcomeKind::FallbackSuccess,
                        fallback_reason: None,
                        endpoint: None,
                        latency_ms: as_millis(latency),
                        config_sequence: self.store.current().sequence(),
                    },
                }
            }
        }
    }

    async fn attempt(&self, request: ServiceRequest) -> DispatchResponse {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let kind = request.kind();
        let snapshot = self.store.current();
        let config_sequence = snapshot.sequence();

        let Some(descriptor) = snapshot.get(kind).filter(|d| d.enabled()) else {
            let payload = self.run_baseline(&request);
            let latency = started.elapsed();
            let payload =
                self.settle(kind, DispatchOutcome::FallbackSuccess { latency, payload });
            tracing::debug!(
                %request_id,
                service = %kind,
                "Service disabled or not configured, serving baseline"
            );
            return DispatchResponse {
                payload,
                baseline: true,
                meta: ResponseMeta {
                    request_id,
                    source: ResponseSource::Fallback,
                    outcome: OutcomeKind::FallbackSuccess,
                    fallback_reason: Some(FailureKind::ServiceDisabled),
                    endpoint: None,
                    latency_ms: as_millis(latency),
                    config_sequence,
                },
            };
        };

        let endpoint = descriptor.endpoint().to_string();
        match self.call_external(kind, descriptor, &request).await {
            Ok(payload) => {
                let latency = started.elapsed();
                let payload =
                    self.settle(kind, DispatchOutcome::ExternalSuccess { latency, payload });
                tracing::debug!(
                    %request_id,
                    service = %kind,
                    latency_ms = latency.as_millis() as u64,
                    "External call succeeded"
                );
                DispatchResponse {
                    payload,
                    baseline: false,
                    meta: ResponseMeta {
                        request_id,
                        source: ResponseSource::External,
                        outcome: OutcomeKind::ExternalSuccess,
                        fallback_reason: None,
                        endpoint: Some(endpoint),
                        latency_ms: as_millis(latency),
                        config_sequence,
                    },
                }
            }
            Err(failure) => {
                let payload = self.run_baseline(&request);
                let latency = started.elapsed();
                self.metrics.record(
                    kind,
                    &DispatchOutcome::ExternalFailure {
                        kind: failure,
                        latency,
                    },
                );
                tracing::warn!(
                    %request_id,
                    service = %kind,
                    failure = %failure,
                    latency_ms = latency.as_millis() as u64,
                    "External call failed, serving baseline"
                );
                DispatchResponse {
                    payload,
                    baseline: true,
                    meta: ResponseMeta {
                        request_id,
                        source: ResponseSource::Fallback,
                        outcome: OutcomeKind::FallbackSuccess,
                        fallback_reason: Some(failure),
                        endpoint: Some(endpoint),
                        latency_ms: as_millis(latency),
                        config_sequence,
                    },
                }
            }
        }
    }

    /// Record a success outcome and hand back the payload it carries.
    fn settle(&self, kind: ServiceKind, outcome: DispatchOutcome) -> ServiceResponse {
        self.metrics.record(kind, &outcome);
        outcome
            .into_payload()
            .unwrap_or_else(|| baseline::static_default(kind))
    }

    /// One attempt, bounded by the descriptor's deadline. The in-flight call is
    /// dropped when the deadline elapses.
    async fn call_external(
        &self,
        kind: ServiceKind,
        descriptor: &ServiceDescriptor,
        request: &ServiceRequest,
    ) -> Result<ServiceResponse, FailureKind> {
        let deadline: Duration = descriptor.timeout();
        let call = self.transport.call(descriptor.endpoint(), request);

        let body = match tokio::time::timeout(deadline, call).await {
            Ok(Ok(body)) => body,
            Ok(Err(e)) => {
                tracing::debug!(service = %kind, "Transport error: {}", e);
                return Err(e.failure_kind());
            }
            Err(_) => return Err(FailureKind::Timeout),
        };

        ServiceResponse::from_value(kind, body).map_err(|e| {
            tracing::debug!(service = %kind, "Response failed schema validation: {}", e);
            FailureKind::InvalidResponseSchema
        })
    }

    fn run_baseline(&self, request: &ServiceRequest) -> ServiceResponse {
        let compute = self.baseline;
        match panic::catch_unwind(AssertUnwindSafe(|| compute(request))) {
            Ok(payload) if payload.kind() == request.kind() => payload,
            _ => {
                let kind = request.kind();
                tracing::error!(service = %kind, "Baseline failed, serving static default");
                self.metrics.record_baseline_defect(kind);
                baseline::static_default(kind)
            }
        }
    }
}
