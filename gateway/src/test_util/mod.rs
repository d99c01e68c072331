//! Helpers shared by unit and integration tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use jobmatch_common::{ServiceKind, ServiceRequest};
use serde_json::{json, Value};

use crate::config::Settings;
use crate::gateway::{
    ConfigSnapshot, ConfigStore, ServiceDescriptor, ServiceTransport, TransportError,
};
use crate::AppState;

pub fn test_settings(services_file: impl Into<PathBuf>) -> Settings {
    Settings {
        services_file: services_file.into(),
        reload_interval_secs: 0,
        ..Default::default()
    }
}

/// App state over an in-memory store that serves `snapshot`.
pub fn create_test_state(
    snapshot: ConfigSnapshot,
    transport: Arc<dyn ServiceTransport>,
) -> Arc<AppState> {
    let settings = test_settings("unused-services.yaml");
    let store = Arc::new(ConfigStore::new(&settings.services_file, snapshot));
    Arc::new(AppState::new(settings, store, transport))
}

pub fn descriptor(kind: ServiceKind, endpoint: &str, timeout_ms: u64) -> ServiceDescriptor {
    ServiceDescriptor::new(kind, endpoint, timeout_ms, true).unwrap()
}

pub fn disabled_descriptor(kind: ServiceKind) -> ServiceDescriptor {
    ServiceDescriptor::new(kind, "", 1_000, false).unwrap()
}

/// A well-formed response body, as an external service would return it.
pub fn external_body(kind: ServiceKind) -> Value {
    match kind {
        ServiceKind::JobRecommender => json!({
            "job_ids": [42, 7],
            "scores": [0.91, 0.64],
            "explanations": ["Skills match", "Similar applications"],
            "method": "collaborative_filtering"
        }),
        ServiceKind::SalaryPredictor => json!({
            "predicted_salary": 151000,
            "confidence_interval": [140000, 162000],
            "comparable_jobs": [],
            "method": "gradient_boosting"
        }),
        ServiceKind::CandidateRanker => json!({
            "ranked_candidate_ids": [3, 1],
            "match_scores": [88, 61],
            "match_reasons": ["Strong skills overlap", "Partial overlap"]
        }),
        ServiceKind::ResumeParser => json!({
            "skills": ["rust"],
            "experience_years": 6,
            "education": {"degree": "BSc"},
            "work_history": [],
            "summary": "Systems engineer"
        }),
        ServiceKind::DemandForecaster => json!({
            "forecast_periods": ["month_1"],
            "predicted_demand": [120],
            "confidence_bounds": [[100, 140]]
        }),
        ServiceKind::CandidateSegmenter => json!({
            "cluster_assignments": [0, 0],
            "cluster_descriptions": ["Backend engineers"],
            "cluster_centroids": [],
            "method": "kmeans"
        }),
    }
}

/// What a [`StubTransport`] does for one call.
#[derive(Debug, Clone)]
pub enum StubReply {
    Body(Value),
    Delayed(Duration, Value),
    Status(u16),
    Refused,
}

type ReplyFn = dyn Fn(usize, &str) -> StubReply + Send + Sync;

/// Scripted transport that records every outbound attempt.
pub struct StubTransport {
    reply: Box<ReplyFn>,
    calls: AtomicUsize,
    endpoints: Mutex<Vec<String>>,
}

impl StubTransport {
    pub fn always(reply: StubReply) -> Self {
        Self::from_fn(move |_, _| reply.clone())
    }

    /// Reply based on the zero-based call index and the endpoint.
    pub fn from_fn(reply: impl Fn(usize, &str) -> StubReply + Send + Sync + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            calls: AtomicUsize::new(0),
            endpoints: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.endpoints.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceTransport for StubTransport {
    async fn call(&self, endpoint: &str, _request: &ServiceRequest) -> Result<Value, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.endpoints.lock().unwrap().push(endpoint.to_string());

        match (self.reply)(call, endpoint) {
            StubReply::Body(body) => Ok(body),
            StubReply::Delayed(delay, body) => {
                tokio::time::sleep(delay).await;
                Ok(body)
            }
            StubReply::Status(status) => Err(TransportError::NonSuccessStatus { status }),
            StubReply::Refused => Err(TransportError::ConnectionFailed {
                endpoint: endpoint.to_string(),
                message: "connection refused".to_string(),
            }),
        }
    }
}
