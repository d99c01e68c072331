//! Deterministic fallback computations, one per logical service.
//!
//! Every function here is total over its typed request: degenerate input
//! yields a documented default rather than an error.

mod forecast;
mod ranker;
mod recommender;
mod resume;
mod salary;
mod segment;

pub use forecast::forecast_demand;
pub use ranker::rank_candidates;
pub use recommender::recommend;
pub use resume::parse_resume;
pub use salary::predict_salary;
pub use segment::segment_candidates;

use jobmatch_common::{
    ForecastDemandResponse, ParseResumeResponse, PredictSalaryResponse, RankResponse,
    RecommendResponse, SegmentResponse, ServiceKind, ServiceRequest, ServiceResponse,
};

/// Method tag reported when a baseline itself failed.
pub const STATIC_DEFAULT_METHOD: &str = "static_default";

/// Run the baseline matching the request's service.
pub fn run(request: &ServiceRequest) -> ServiceResponse {
    match request {
        ServiceRequest::Recommend(req) => ServiceResponse::Recommend(recommend(req)),
        ServiceRequest::PredictSalary(req) => ServiceResponse::PredictSalary(predict_salary(req)),
        ServiceRequest::Rank(req) => ServiceResponse::Rank(rank_candidates(req)),
        ServiceRequest::ParseResume(req) => ServiceResponse::ParseResume(parse_resume(req)),
        ServiceRequest::ForecastDemand(req) => {
            ServiceResponse::ForecastDemand(forecast_demand(req))
        }
        ServiceRequest::Segment(req) => ServiceResponse::Segment(segment_candidates(req)),
    }
}

/// Fixed, input-independent answer for `kind`.
pub fn static_default(kind: ServiceKind) -> ServiceResponse {
    let method = Some(STATIC_DEFAULT_METHOD.to_string());
    match kind {
        ServiceKind::JobRecommender => ServiceResponse::Recommend(RecommendResponse {
            job_ids: vec![],
            scores: vec![],
            explanations: vec![],
            method,
        }),
        ServiceKind::SalaryPredictor => ServiceResponse::PredictSalary(PredictSalaryResponse {
            predicted_salary: salary::DEFAULT_SALARY,
            confidence_interval: salary::default_interval(),
            comparable_jobs: vec![],
            method,
        }),
        ServiceKind::CandidateRanker => ServiceResponse::Rank(RankResponse {
            ranked_candidate_ids: vec![],
            match_scores: vec![],
            match_reasons: vec![],
            method,
        }),
        ServiceKind::ResumeParser => ServiceResponse::ParseResume(ParseResumeResponse {
            skills: vec![],
            experience_years: None,
            education: serde_json::Map::new(),
            work_history: vec![],
            summary: String::new(),
            method,
        }),
        ServiceKind::DemandForecaster => ServiceResponse::ForecastDemand(ForecastDemandResponse {
            forecast_periods: vec![],
            predicted_demand: vec![],
            confidence_bounds: vec![],
            method,
        }),
        ServiceKind::CandidateSegmenter => ServiceResponse::Segment(SegmentResponse {
            cluster_assignments: vec![],
            cluster_descriptions: vec![],
            cluster_centroids: vec![],
            method,
        }),
    }
}
