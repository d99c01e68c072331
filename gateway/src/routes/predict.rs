//! Client-facing prediction routes, one per logical service.
//!
//! Every well-formed request gets a payload back, computed externally or by
//! the baseline. Only bodies that fail to deserialize are rejected.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use jobmatch_common::{
    ForecastDemandRequest, ParseResumeRequest, PredictSalaryRequest, RankRequest,
    RecommendRequest, SegmentRequest, ServiceRequest,
};

use crate::error::Result;
use crate::gateway::DispatchResponse;
use crate::AppState;

async fn dispatch<T>(
    state: &AppState,
    payload: std::result::Result<Json<T>, JsonRejection>,
    wrap: fn(T) -> ServiceRequest,
) -> Result<Json<DispatchResponse>> {
    let Json(request) = payload?;
    Ok(Json(state.dispatcher.dispatch(wrap(request)).await))
}

/// POST /api/recommend
async fn recommend(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<DispatchResponse>> {
    dispatch(&state, payload, ServiceRequest::Recommend).await
}

/// POST /api/predict-salary
async fn predict_salary(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<PredictSalaryRequest>, JsonRejection>,
) -> Result<Json<DispatchResponse>> {
    dispatch(&state, payload, ServiceRequest::PredictSalary).await
}

/// POST /api/rank-candidates
async fn rank_candidates(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<RankRequest>, JsonRejection>,
) -> Result<Json<DispatchResponse>> {
    dispatch(&state, payload, ServiceRequest::Rank).await
}

/// POST /api/parse-resume
async fn parse_resume(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ParseResumeRequest>, JsonRejection>,
) -> Result<Json<DispatchResponse>> {
    dispatch(&state, payload, ServiceRequest::ParseResume).await
}

/// POST /api/forecast-demand
async fn forecast_demand(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ForecastDemandRequest>, JsonRejection>,
) -> Result<Json<DispatchResponse>> {
    dispatch(&state, payload, ServiceRequest::ForecastDemand).await
}

/// POST /api/segment-candidates
async fn segment_candidates(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SegmentRequest>, JsonRejection>,
) -> Result<Json<DispatchResponse>> {
    dispatch(&state, payload, ServiceRequest::Segment).await
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/recommend", post(recommend))
        .route("/api/predict-salary", post(predict_salary))
        .route("/api/rank-candidates", post(rank_candidates))
        .route("/api/parse-resume", post(parse_resume))
        .route("/api/forecast-demand", post(forecast_demand))
        .route("/api/segment-candidates", post(segment_candidates))
        .with_state(state)
}
