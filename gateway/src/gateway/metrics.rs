//! In-memory per-service dispatch metrics.
//!
//! Each service gets a recorder on first use. Counters and the sample ring
//! buffer sit behind one short-lived mutex so the three outcome counters always
//! add up to `total_requests`.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use jobmatch_common::ServiceKind;
use serde::Serialize;

use super::health::{as_millis, classify, HealthAssessment, HealthStatus};
use super::outcome::{DispatchOutcome, FailureKind, OutcomeKind};
use crate::config::HealthPolicy;

/// One recorded dispatch.
#[derive(Debug, Clone, Copy)]
pub struct Sample {
    pub at: Instant,
    pub latency: Duration,
    pub outcome: OutcomeKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastError {
    pub kind: FailureKind,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub samples: usize,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
}

/// Point-in-time copy of one service's metrics.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceMetrics {
    pub service: ServiceKind,
    pub total_requests: u64,
    pub external_success_count: u64,
    pub fallback_success_count: u64,
    pub failure_count: u64,
    pub failures_by_kind: BTreeMap<FailureKind, u64>,
    /// Baseline functions that panicked and were replaced by a static default.
    pub baseline_defect_count: u64,
    pub latency: LatencySummary,
    pub last_error: Option<LastError>,
}

impl ServiceMetrics {
    fn empty(service: ServiceKind) -> Self {
        Self {
            service,
            total_requests: 0,
            external_success_count: 0,
            fallback_success_count: 0,
            failure_count: 0,
            failures_by_kind: BTreeMap::new(),
            baseline_defect_count: 0,
            latency: LatencySummary::default(),
            last_error: None,
        }
    }
}

#[derive(Debug)]
struct Recorder {
    total_requests: u64,
    external_success_count: u64,
    fallback_success_count: u64,
    failure_count: u64,
    failures_by_kind: BTreeMap<FailureKind, u64>,
    baseline_defect_count: u64,
    last_error: Option<LastError>,
    samples: VecDeque<Sample>,
}

impl Recorder {
    fn new(capacity: usize) -> Self {
        Self {
            total_requests: 0,
            external_success_count: 0,
            fallback_success_count: 0,
            failure_count: 0,
            failures_by_kind: BTreeMap::new(),
            baseline_defect_count: 0,
            last_error: None,
            samples: VecDeque::with_capacity(capacity),
        }
    }
}

/// Records dispatch outcomes and derives metrics and health per service.
pub struct MetricsAggregator {
    recorders: RwLock<HashMap<ServiceKind, Arc<Mutex<Recorder>>>>,
    capacity: usize,
    policy: HealthPolicy,
}

impl MetricsAggregator {
    pub fn new(capacity: usize, policy: HealthPolicy) -> Self {
        Self {
            recorders: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            policy,
        }
    }

    pub fn policy(&self) -> &HealthPolicy {
        &self.policy
    }

    /// Record the outcome of one dispatch.
    pub fn record(&self, service: ServiceKind, outcome: &DispatchOutcome) {
        let now = Instant::now();
        let recorder = self.recorder(service);
        let mut rec = recorder.lock().unwrap_or_else(PoisonError::into_inner);

        rec.total_requests += 1;
        match outcome {
            DispatchOutcome::ExternalSuccess { .. } => rec.external_success_count += 1,
            DispatchOutcome::FallbackSuccess { .. } => rec.fallback_success_count += 1,
            DispatchOutcome::ExternalFailure { kind, .. } => {
                rec.failure_count += 1;
                *rec.failures_by_kind.entry(*kind).or_insert(0) += 1;
                rec.last_error = Some(LastError {
                    kind: *kind,
                    at: Utc::now(),
                });
            }
        }

        if rec.samples.len() >= self.capacity {
            rec.samples.pop_front();
        }
        rec.samples.push_back(Sample {
            at: now,
            latency: outcome.latency(),
            outcome: outcome.kind(),
        });
    }

    /// Count a baseline function that failed and was replaced by a static default.
    pub fn record_baseline_defect(&self, service: ServiceKind) {
        let recorder = self.recorder(service);
        let mut rec = recorder.lock().unwrap_or_else(PoisonError::into_inner);
        rec.baseline_defect_count += 1;
    }

    /// Metrics for `service`; zeroed if it has never been dispatched.
    pub fn snapshot(&self, service: ServiceKind) -> ServiceMetrics {
        let Some(recorder) = self.existing(service) else {
            return ServiceMetrics::empty(service);
        };

        let (mut metrics, mut latencies) = {
            let rec = recorder.lock().unwrap_or_else(PoisonError::into_inner);
            let metrics = ServiceMetrics {
                service,
                total_requests: rec.total_requests,
                external_success_count: rec.external_success_count,
                fallback_success_count: rec.fallback_success_count,
                failure_count: rec.failure_count,
                failures_by_kind: rec.failures_by_kind.clone(),
                baseline_defect_count: rec.baseline_defect_count,
                latency: LatencySummary::default(),
                last_error: rec.last_error.clone(),
            };
            let latencies: Vec<Duration> = rec.samples.iter().map(|s| s.latency).collect();
            (metrics, latencies)
        };

        // Sorting happens outside the lock.
        latencies.sort_unstable();
        if !latencies.is_empty() {
            metrics.latency = LatencySummary {
                samples: latencies.len(),
                p50_ms: Some(as_millis(percentile(&latencies, 50))),
                p95_ms: Some(as_millis(percentile(&latencies, 95))),
                p99_ms: Some(as_millis(percentile(&latencies, 99))),
            };
        }
        metrics
    }

    /// Health status for `service`, given its configured deadline.
    pub fn health(&self, service: ServiceKind, timeout: Option<Duration>) -> HealthStatus {
        self.assess(service, timeout).status
    }

    /// Health status plus the window figures behind it.
    pub fn assess(&self, service: ServiceKind, timeout: Option<Duration>) -> HealthAssessment {
        let samples: Vec<Sample> = match self.existing(service) {
            Some(recorder) => {
                let rec = recorder.lock().unwrap_or_else(PoisonError::into_inner);
                rec.samples.iter().copied().collect()
            }
            None => Vec::new(),
        };
        classify(&samples, &self.policy, timeout, Instant::now())
    }

    fn existing(&self, service: ServiceKind) -> Option<Arc<Mutex<Recorder>>> {
        self.recorders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&service)
            .cloned()
    }

    fn recorder(&self, service: ServiceKind) -> Arc<Mutex<Recorder>> {
        if let Some(recorder) = self.existing(service) {
            return recorder;
        }
        let mut recorders = self.recorders.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            recorders
                .entry(service)
                .or_insert_with(|| Arc::new(Mutex::new(Recorder::new(self.capacity)))),
        )
    }
}

/// Nearest-rank percentile over sorted values.
pub(crate) fn percentile(sorted: &[Duration], pct: u64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }
    let last = sorted.len() - 1;
    let index = (pct.min(100) as usize * last + 50) / 100;
    sorted[index.min(last)]
}
