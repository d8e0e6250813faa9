//! Rank fusion and candidate merging
//!
//! Client-side Reciprocal Rank Fusion for stores without server-side fusion,
//! plus the cross-collection merge used by the retrieval pipeline. Ordering
//! is deterministic: equal scores break by lexicographic chunk id.

use std::collections::HashMap;

use ccx_domain::ports::ScoredPoint;

/// Fuse ranked lists with RRF: `score = sum over lists of 1 / (k + rank)`
///
/// Ranks are 1-based; a candidate absent from a list contributes nothing for
/// that list. Applied to a single list this preserves its ordering.
pub fn rrf_fuse(lists: Vec<Vec<ScoredPoint>>, k: f64) -> Vec<ScoredPoint> {
    let mut fused: HashMap<String, ScoredPoint> = HashMap::new();

    for list in lists {
        for (rank, point) in list.into_iter().enumerate() {
            let contribution = 1.0 / (k + (rank + 1) as f64);
            match fused.get_mut(&point.id) {
                Some(existing) => existing.score += contribution,
                None => {
                    let mut point = point;
                    point.score = contribution;
                    fused.insert(point.id.clone(), point);
                }
            }
        }
    }

    let mut out: Vec<ScoredPoint> = fused.into_values().collect();
    sort_deterministic(&mut out);
    out
}

/// Merge candidates from several collections, deduplicating by chunk id and
/// keeping the higher score
pub fn merge_candidates(lists: Vec<Vec<ScoredPoint>>) -> Vec<ScoredPoint> {
    let mut merged: HashMap<String, ScoredPoint> = HashMap::new();
    for list in lists {
        for point in list {
            match merged.get_mut(&point.id) {
                Some(existing) if existing.score >= point.score => {}
                _ => {
                    merged.insert(point.id.clone(), point);
                }
            }
        }
    }
    let mut out: Vec<ScoredPoint> = merged.into_values().collect();
    sort_deterministic(&mut out);
    out
}

/// Sort by descending score, breaking ties by ascending chunk id
pub fn sort_deterministic(points: &mut [ScoredPoint]) {
    points.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccx_domain::value_objects::ChunkPayload;

    fn point(id: &str, score: f64) -> ScoredPoint {
        ScoredPoint {
            id: id.to_string(),
            score,
            payload: ChunkPayload {
                project_id: "p".into(),
                dataset_id: "d".into(),
                source_path: format!("src/{id}.rs"),
                language: "rust".into(),
                symbol_name: None,
                repo: None,
            },
            content: String::new(),
        }
    }

    #[test]
    fn rrf_over_single_list_preserves_ordering() {
        let input = vec![point("a", 0.9), point("b", 0.5), point("c", 0.1)];
        let fused = rrf_fuse(vec![input.clone()], 60.0);
        let order: Vec<&str> = fused.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn rrf_rewards_presence_in_both_lists() {
        let dense = vec![point("a", 0.9), point("b", 0.8), point("c", 0.7)];
        let sparse = vec![point("b", 3.0), point("d", 2.0)];
        let fused = rrf_fuse(vec![dense, sparse], 60.0);

        // b appears in both lists: 1/62 + 1/61 beats a's 1/61
        assert_eq!(fused[0].id, "b");
        let expected = 1.0 / 62.0 + 1.0 / 61.0;
        assert!((fused[0].score - expected).abs() < 1e-12);
    }

    #[test]
    fn merge_keeps_higher_score_per_id() {
        let merged = merge_candidates(vec![
            vec![point("a", 0.4), point("b", 0.9)],
            vec![point("a", 0.7)],
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, "b");
        assert!((merged[1].score - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn ties_break_lexicographically() {
        let mut points = vec![point("zzz", 0.5), point("aaa", 0.5), point("mmm", 0.5)];
        sort_deterministic(&mut points);
        let order: Vec<&str> = points.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["aaa", "mmm", "zzz"]);
    }
}
