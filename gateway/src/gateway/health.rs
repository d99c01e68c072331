//! Rolling health classification.
//!
//! Health is never stored; it is recomputed from the most recent samples on
//! every read.

use std::time::{Duration, Instant};

use serde::Serialize;

use super::metrics::{percentile, Sample};
use super::outcome::OutcomeKind;
use crate::config::HealthPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Unknown,
    Healthy,
    Degraded,
    Down,
}

/// Health status plus the window figures it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthAssessment {
    pub status: HealthStatus,
    pub window_samples: usize,
    pub external_success_ratio: Option<f64>,
    pub window_failures: usize,
    pub p95_ms: Option<f64>,
}

/// Classify `samples` (oldest first) as of `now`.
///
/// The window is the most recent `window_size` samples no older than
/// `window_secs`. `timeout` is the service's configured deadline, if any.
pub fn classify(
    samples: &[Sample],
    policy: &HealthPolicy,
    timeout: Option<Duration>,
    now: Instant,
) -> HealthAssessment {
    let max_age = policy.window_age();
    let window: Vec<&Sample> = samples
        .iter()
        .rev()
        .take_while(|s| now.saturating_duration_since(s.at) <= max_age)
        .take(policy.window_size)
        .collect();

    let window_samples = window.len();
    if window_samples == 0 || window_samples < policy.min_samples {
        return HealthAssessment {
            status: HealthStatus::Unknown,
            window_samples,
            external_success_ratio: None,
            window_failures: 0,
            p95_ms: None,
        };
    }

    let successes = window
        .iter()
        .filter(|s| s.outcome == OutcomeKind::ExternalSuccess)
        .count();
    let failures = window
        .iter()
        .filter(|s| s.outcome == OutcomeKind::ExternalFailure)
        .count();
    let ratio = successes as f64 / window_samples as f64;

    let mut latencies: Vec<Duration> = window.iter().map(|s| s.latency).collect();
    latencies.sort_unstable();
    let p95 = percentile(&latencies, 95);

    let too_slow = timeout.is_some_and(|t| p95.as_secs_f64() > t.as_secs_f64() * policy.latency_ratio);

    let status = if successes == 0 && failures > 0 {
        HealthStatus::Down
    } else if ratio < policy.success_threshold || too_slow {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    HealthAssessment {
        status,
        window_samples,
        external_success_ratio: Some(ratio),
        window_failures: failures,
        p95_ms: Some(as_millis(p95)),
    }
}

pub(crate) fn as_millis(d: Duration) -> f64 {
    (d.as_secs_f64() * 1_000_000.0).round() / 1_000.0
}
