//! First-come, first-served candidate ranking.

use jobmatch_common::{RankRequest, RankResponse};

const UNIFORM_SCORE: u32 = 50;
const FIFO_REASON: &str = "Application order (FIFO)";

/// Order candidates by application time, earliest first.
///
/// Undated candidates follow dated ones. A missing id is replaced by the
/// candidate's 1-based position in the request.
pub fn rank_candidates(request: &RankRequest) -> RankResponse {
    let mut candidates: Vec<_> = request
        .candidate_profiles
        .iter()
        .enumerate()
        .map(|(i, c)| (c.applied_at, c.id.unwrap_or(i as i64 + 1)))
        .collect();
    candidates.sort_by_key(|&(applied_at, id)| (applied_at.is_none(), applied_at, id));

    let ranked_candidate_ids: Vec<i64> = candidates.into_iter().map(|(_, id)| id).collect();
    let count = ranked_candidate_ids.len();

    RankResponse {
        ranked_candidate_ids,
        match_scores: vec![UNIFORM_SCORE; count],
        match_reasons: vec![FIFO_REASON.to_string(); count],
        method: Some("fifo".to_string()),
    }
}
