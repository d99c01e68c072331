//! Job-side contracts: recommendation, salary prediction, demand forecasting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A job posting as seen by the recommender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
}

/// Job recommendation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub candidate_id: i64,
    /// Category the candidate stated as preferred.
    #[serde(default)]
    pub preferred_category: Option<String>,
    /// Open postings the recommendation is drawn from.
    #[serde(default)]
    pub available_jobs: Vec<JobPosting>,
    #[serde(default)]
    pub interaction_history: Vec<serde_json::Value>,
    #[serde(default = "default_num_recommendations")]
    pub num_recommendations: usize,
}

impl Default for RecommendRequest {
    fn default() -> Self {
        Self {
            candidate_id: 0,
            preferred_category: None,
            available_jobs: vec![],
            interaction_history: vec![],
            num_recommendations: default_num_recommendations(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub job_ids: Vec<i64>,
    pub scores: Vec<f64>,
    pub explanations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Salary prediction request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictSalaryRequest {
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub company_size: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub experience_range: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictSalaryResponse {
    pub predicted_salary: u64,
    /// `[low, high]`
    pub confidence_interval: [u64; 2],
    #[serde(default)]
    pub comparable_jobs: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Demand forecast request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastDemandRequest {
    #[serde(default)]
    pub skill_category: String,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Number of currently open postings for the category, if known.
    #[serde(default)]
    pub current_open_postings: Option<u64>,
    #[serde(default)]
    pub historical_postings: Vec<serde_json::Value>,
    /// Number of monthly periods to forecast.
    #[serde(default = "default_forecast_horizon")]
    pub forecast_horizon: usize,
}

impl Default for ForecastDemandRequest {
    fn default() -> Self {
        Self {
            skill_category: String::new(),
            industry: None,
            location: None,
            current_open_postings: None,
            historical_postings: vec![],
            forecast_horizon: default_forecast_horizon(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDemandResponse {
    pub forecast_periods: Vec<String>,
    pub predicted_demand: Vec<u64>,
    pub confidence_bounds: Vec<[u64; 2]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

fn default_num_recommendations() -> usize {
    10
}

fn default_forecast_horizon() -> usize {
    6
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommend_request_defaults() {
        let req: RecommendRequest = serde_json::from_str(r#"{"candidate_id": 7}"#).unwrap();
        assert_eq!(req.candidate_id, 7);
        assert_eq!(req.num_recommendations, 10);
        assert!(req.preferred_category.is_none());
        assert!(req.available_jobs.is_empty());
    }

    #[test]
    fn test_job_posting_parses_rfc3339() {
        let job: JobPosting = serde_json::from_str(
            r#"{"id": 3, "category": "Engineering", "posted_at": "2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(job.id, 3);
        assert_eq!(job.posted_at.unwrap().to_rfc3339(), "2024-05-01T10:00:00+00:00");
    }

    #[test]
    fn test_forecast_request_defaults() {
        let req: ForecastDemandRequest =
            serde_json::from_str(r#"{"skill_category": "Python"}"#).unwrap();
        assert_eq!(req.forecast_horizon, 6);
        assert!(req.current_open_postings.is_none());
    }

    #[test]
    fn test_salary_interval_serializes_as_pair() {
        let response = PredictSalaryResponse {
            predicted_salary: 100,
            confidence_interval: [85, 115],
            comparable_jobs: vec![],
            method: None,
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains(r#""confidence_interval":[85,115]"#));
        assert!(!json.contains("method"));
    }
}
