//! Category-grouping segmenter.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

use jobmatch_common::{CandidateProfile, SegmentRequest, SegmentResponse};
use serde_json::json;

const UNCATEGORIZED: &str = "uncategorized";

#[derive(Debug, Default)]
struct Cluster {
    /// Alphabetically smallest category. Categories are disjoint across
    /// clusters, so this orders clusters of equal size.
    first: String,
    /// Sorted once merging is done.
    categories: Vec<String>,
    members: Vec<usize>,
}

impl Cluster {
    fn label(&self) -> String {
        self.categories.join(", ")
    }

    fn absorb(&mut self, other: Cluster) {
        if other.first < self.first {
            self.first = other.first;
        }
        self.categories.extend(other.categories);
        self.members.extend(other.members);
    }
}

/// Group candidates by primary category, merging the two smallest groups
/// (ties broken by first category) until at most `num_clusters` remain.
pub fn segment_candidates(request: &SegmentRequest) -> SegmentResponse {
    let max_clusters = request.num_clusters.max(1);

    let mut by_category: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, candidate) in request.candidate_profiles.iter().enumerate() {
        by_category.entry(category_of(candidate)).or_default().push(i);
    }
    let mut slots: Vec<Cluster> = by_category
        .into_iter()
        .map(|(category, members)| Cluster {
            first: category.clone(),
            categories: vec![category],
            members,
        })
        .collect();

    let mut queue: BinaryHeap<Reverse<(usize, String, usize)>> = slots
        .iter()
        .enumerate()
        .map(|(slot, c)| Reverse((c.members.len(), c.first.clone(), slot)))
        .collect();
    while queue.len() > max_clusters {
        let (Some(Reverse((_, _, smallest))), Some(Reverse((_, _, next)))) =
            (queue.pop(), queue.pop())
        else {
            break;
        };
        let absorbed = std::mem::take(&mut slots[smallest]);
        slots[next].absorb(absorbed);
        let merged = &slots[next];
        queue.push(Reverse((merged.members.len(), merged.first.clone(), next)));
    }

    let mut clusters: Vec<Cluster> = queue
        .into_iter()
        .map(|Reverse((_, _, slot))| std::mem::take(&mut slots[slot]))
        .collect();
    for cluster in &mut clusters {
        cluster.categories.sort();
    }
    clusters.sort_by(|a, b| {
        (Reverse(a.members.len()), &a.first).cmp(&(Reverse(b.members.len()), &b.first))
    });

    let mut cluster_assignments = vec![0; request.candidate_profiles.len()];
    for (index, cluster) in clusters.iter().enumerate() {
        for &member in &cluster.members {
            cluster_assignments[member] = index;
        }
    }

    SegmentResponse {
        cluster_assignments,
        cluster_descriptions: clusters
            .iter()
            .map(|c| format!("{} ({} candidates)", c.label(), c.members.len()))
            .collect(),
        cluster_centroids: clusters
            .iter()
            .map(|c| json!({ "categories": c.categories, "size": c.members.len() }))
            .collect(),
        method: Some("category_grouping".to_string()),
    }
}

fn category_of(candidate: &CandidateProfile) -> String {
    candidate
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(UNCATEGORIZED)
        .to_string()
}
