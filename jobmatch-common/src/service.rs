//! Logical service identities and the typed request/response envelopes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::candidates::{
    ParseResumeRequest, ParseResumeResponse, RankRequest, RankResponse, SegmentRequest,
    SegmentResponse,
};
use crate::jobs::{
    ForecastDemandRequest, ForecastDemandResponse, PredictSalaryRequest, PredictSalaryResponse,
    RecommendRequest, RecommendResponse,
};

/// The six fixed prediction capabilities routed by the gateway.
///
/// The serialized form (`job_recommender`, ...) is the key used in the
/// services document and in admin reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    JobRecommender,
    SalaryPredictor,
    CandidateRanker,
    ResumeParser,
    DemandForecaster,
    CandidateSegmenter,
}

impl ServiceKind {
    /// All service variants for iteration.
    pub const ALL: [ServiceKind; 6] = [
        ServiceKind::JobRecommender,
        ServiceKind::SalaryPredictor,
        ServiceKind::CandidateRanker,
        ServiceKind::ResumeParser,
        ServiceKind::DemandForecaster,
        ServiceKind::CandidateSegmenter,
    ];

    /// Name used in the services document.
    pub fn config_key(&self) -> &'static str {
        match self {
            ServiceKind::JobRecommender => "job_recommender",
            ServiceKind::SalaryPredictor => "salary_predictor",
            ServiceKind::CandidateRanker => "candidate_ranker",
            ServiceKind::ResumeParser => "resume_parser",
            ServiceKind::DemandForecaster => "demand_forecaster",
            ServiceKind::CandidateSegmenter => "candidate_segmenter",
        }
    }

    /// Strict lookup by services-document key. Route aliases are not accepted.
    pub fn from_config_key(key: &str) -> Option<Self> {
        ServiceKind::ALL
            .into_iter()
            .find(|kind| kind.config_key() == key)
    }

    /// Short alias used in the client-facing routes (`/api/<alias>`).
    pub fn route_alias(&self) -> &'static str {
        match self {
            ServiceKind::JobRecommender => "recommend",
            ServiceKind::SalaryPredictor => "predict-salary",
            ServiceKind::CandidateRanker => "rank-candidates",
            ServiceKind::ResumeParser => "parse-resume",
            ServiceKind::DemandForecaster => "forecast-demand",
            ServiceKind::CandidateSegmenter => "segment-candidates",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

/// Returned when a name matches none of the six logical services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown service '{0}'")]
pub struct UnknownService(pub String);

impl FromStr for ServiceKind {
    type Err = UnknownService;

    /// Accepts either the config key or the route alias.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ServiceKind::ALL
            .into_iter()
            .find(|kind| kind.config_key() == name || kind.route_alias() == name)
            .ok_or_else(|| UnknownService(name.to_string()))
    }
}

/// A validated request for one of the six services.
///
/// Serializes as the inner request body, which is what external services receive.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ServiceRequest {
    Recommend(RecommendRequest),
    PredictSalary(PredictSalaryRequest),
    Rank(RankRequest),
    ParseResume(ParseResumeRequest),
    ForecastDemand(ForecastDemandRequest),
    Segment(SegmentRequest),
}

impl ServiceRequest {
    pub fn kind(&self) -> ServiceKind {
        match self {
            ServiceRequest::Recommend(_) => ServiceKind::JobRecommender,
            ServiceRequest::PredictSalary(_) => ServiceKind::SalaryPredictor,
            ServiceRequest::Rank(_) => ServiceKind::CandidateRanker,
            ServiceRequest::ParseResume(_) => ServiceKind::ResumeParser,
            ServiceRequest::ForecastDemand(_) => ServiceKind::DemandForecaster,
            ServiceRequest::Segment(_) => ServiceKind::CandidateSegmenter,
        }
    }
}

/// A response payload for one of the six services.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServiceResponse {
    Recommend(RecommendResponse),
    PredictSalary(PredictSalaryResponse),
    Rank(RankResponse),
    ParseResume(ParseResumeResponse),
    ForecastDemand(ForecastDemandResponse),
    Segment(SegmentResponse),
}

impl ServiceResponse {
    pub fn kind(&self) -> ServiceKind {
        match self {
            ServiceResponse::Recommend(_) => ServiceKind::JobRecommender,
            ServiceResponse::PredictSalary(_) => ServiceKind::SalaryPredictor,
            ServiceResponse::Rank(_) => ServiceKind::CandidateRanker,
            ServiceResponse::ParseResume(_) => ServiceKind::ResumeParser,
            ServiceResponse::ForecastDemand(_) => ServiceKind::DemandForecaster,
            ServiceResponse::Segment(_) => ServiceKind::CandidateSegmenter,
        }
    }

    /// Validate an untyped JSON body against the frozen schema of `kind`.
    ///
    /// Required fields must be present with matching types; unknown fields
    /// (such as an echoed `baseline` flag) are ignored.
    pub fn from_value(kind: ServiceKind, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            ServiceKind::JobRecommender => ServiceResponse::Recommend(serde_json::from_value(value)?),
            ServiceKind::SalaryPredictor => {
                ServiceResponse::PredictSalary(serde_json::from_value(value)?)
            }
            ServiceKind::CandidateRanker => ServiceResponse::Rank(serde_json::from_value(value)?),
            ServiceKind::ResumeParser => ServiceResponse::ParseResume(serde_json::from_value(value)?),
            ServiceKind::DemandForecaster => {
                ServiceResponse::ForecastDemand(serde_json::from_value(value)?)
            }
            ServiceKind::CandidateSegmenter => ServiceResponse::Segment(serde_json::from_value(value)?),
        })
    }
}
