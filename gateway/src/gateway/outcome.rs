//! Dispatch outcomes recorded by the metrics aggregator.

use std::fmt;
use std::time::Duration;

use jobmatch_common::ServiceResponse;
use serde::Serialize;

/// Why the external service did not produce the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    ConnectionRefused,
    InvalidResponseSchema,
    NonSuccessStatus,
    ServiceDisabled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Timeout => "timeout",
            FailureKind::ConnectionRefused => "connection_refused",
            FailureKind::InvalidResponseSchema => "invalid_response_schema",
            FailureKind::NonSuccessStatus => "non_success_status",
            FailureKind::ServiceDisabled => "service_disabled",
        };
        f.write_str(name)
    }
}

/// Coarse outcome class, as stored in metric samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    ExternalSuccess,
    FallbackSuccess,
    ExternalFailure,
}

/// Exactly one of these is recorded per dispatch.
///
/// `ExternalFailure` means an external attempt was made and failed; the client
/// was still answered by the baseline. `FallbackSuccess` means no attempt was
/// made because the service is disabled or not configured. The success variants
/// carry the payload that answered the request.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    ExternalSuccess {
        latency: Duration,
        payload: ServiceResponse,
    },
    FallbackSuccess {
        latency: Duration,
        payload: ServiceResponse,
    },
    ExternalFailure {
        kind: FailureKind,
        latency: Duration,
    },
}

impl DispatchOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            DispatchOutcome::ExternalSuccess { .. } => OutcomeKind::ExternalSuccess,
            DispatchOutcome::FallbackSuccess { .. } => OutcomeKind::FallbackSuccess,
            DispatchOutcome::ExternalFailure { .. } => OutcomeKind::ExternalFailure,
        }
    }

    pub fn latency(&self) -> Duration {
        match self {
            DispatchOutcome::ExternalSuccess { latency, .. }
            | DispatchOutcome::FallbackSuccess { latency, .. }
            | DispatchOutcome::ExternalFailure { latency, .. } => *latency,
        }
    }

    pub fn failure(&self) -> Option<FailureKind> {
        match self {
            DispatchOutcome::ExternalFailure { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&ServiceResponse> {
        match self {
            DispatchOutcome::ExternalSuccess { payload, .. }
            | DispatchOutcome::FallbackSuccess { payload, .. } => Some(payload),
            DispatchOutcome::ExternalFailure { .. } => None,
        }
    }

    pub fn into_payload(self) -> Option<ServiceResponse> {
        match self {
            DispatchOutcome::ExternalSuccess { payload, .. }
            | DispatchOutcome::FallbackSuccess { payload, .. } => Some(payload),
            DispatchOutcome::ExternalFailure { .. } => None,
        }
    }
}
