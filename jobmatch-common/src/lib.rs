//! JobMatch Common Types
//!
//! Shared wire contracts used by the gateway and by external model services.

pub mod candidates;
pub mod jobs;
pub mod service;

pub use candidates::{
    CandidateProfile, ParseResumeRequest, ParseResumeResponse, RankRequest, RankResponse,
    SegmentRequest, SegmentResponse,
};
pub use jobs::{
    ForecastDemandRequest, ForecastDemandResponse, JobPosting, PredictSalaryRequest,
    PredictSalaryResponse, RecommendRequest, RecommendResponse,
};
pub use service::{ServiceKind, ServiceRequest, ServiceResponse, UnknownService};
