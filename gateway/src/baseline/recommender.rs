//! Most-recent-postings recommender.

use std::cmp::{Ordering, Reverse};

use jobmatch_common::{JobPosting, RecommendRequest, RecommendResponse};

/// Upper bound on returned recommendations.
pub const MAX_RECOMMENDATIONS: usize = 100;

/// Recommend the most recently posted jobs, preferring the candidate's
/// category when any posting matches it.
pub fn recommend(request: &RecommendRequest) -> RecommendResponse {
    let preferred = request
        .preferred_category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let matching: Vec<&JobPosting> = match preferred {
        Some(category) => request
            .available_jobs
            .iter()
            .filter(|job| {
                job.category
                    .as_deref()
                    .is_some_and(|c| c.trim().eq_ignore_ascii_case(category))
            })
            .collect(),
        None => Vec::new(),
    };

    let (mut jobs, matched_category) = if matching.is_empty() {
        (request.available_jobs.iter().collect::<Vec<_>>(), None)
    } else {
        (matching, preferred)
    };
    jobs.sort_by(|a, b| by_recency(a, b));

    let count = request.num_recommendations.min(MAX_RECOMMENDATIONS);
    let explanation = match matched_category {
        Some(category) => format!("Recent posting in preferred category '{}'", category),
        None => "Based on recency".to_string(),
    };

    let job_ids: Vec<i64> = jobs.iter().take(count).map(|job| job.id).collect();
    let scores = (0..job_ids.len()).map(rank_score).collect();
    let explanations = vec![explanation; job_ids.len()];

    RecommendResponse {
        job_ids,
        scores,
        explanations,
        method: Some("most_recent".to_string()),
    }
}

/// Newest first, undated last, then id descending.
fn by_recency(a: &JobPosting, b: &JobPosting) -> Ordering {
    let key = |job: &JobPosting| (job.posted_at.is_none(), Reverse(job.posted_at), Reverse(job.id));
    key(a).cmp(&key(b))
}

fn rank_score(rank: usize) -> f64 {
    (1000.0 / (rank as f64 + 1.0)).round() / 1000.0
}
