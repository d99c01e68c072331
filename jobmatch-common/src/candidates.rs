//! Candidate-side contracts: ranking, resume parsing, segmentation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A candidate as submitted for ranking or segmentation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default)]
    pub id: Option<i64>,
    /// Primary category (e.g. "engineering").
    #[serde(default)]
    pub category: Option<String>,
    /// When the candidate applied.
    #[serde(default)]
    pub applied_at: Option<DateTime<Utc>>,
}

/// Candidate ranking request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankRequest {
    #[serde(default)]
    pub job_id: i64,
    #[serde(default)]
    pub job_requirements: Option<serde_json::Value>,
    #[serde(default)]
    pub candidate_profiles: Vec<CandidateProfile>,
    #[serde(default)]
    pub historical_hires: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankResponse {
    pub ranked_candidate_ids: Vec<i64>,
    pub match_scores: Vec<u32>,
    pub match_reasons: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Resume parsing request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseResumeRequest {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub resume_format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResumeResponse {
    pub skills: Vec<String>,
    /// `None` when no "N years" phrase was found.
    #[serde(default)]
    pub experience_years: Option<u32>,
    #[serde(default)]
    pub education: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub work_history: Vec<serde_json::Value>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Candidate segmentation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRequest {
    #[serde(default)]
    pub candidate_profiles: Vec<CandidateProfile>,
    #[serde(default)]
    pub feature_set: Vec<String>,
    /// Upper bound on the number of clusters returned.
    #[serde(default = "default_num_clusters")]
    pub num_clusters: usize,
}

impl Default for SegmentRequest {
    fn default() -> Self {
        Self {
            candidate_profiles: vec![],
            feature_set: vec![],
            num_clusters: default_num_clusters(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentResponse {
    /// Cluster index per input candidate, in input order.
    pub cluster_assignments: Vec<usize>,
    pub cluster_descriptions: Vec<String>,
    #[serde(default)]
    pub cluster_centroids: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

fn default_num_clusters() -> usize {
    3
}
