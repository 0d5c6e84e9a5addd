//! Metrics over a binary relevant/not-relevant judgment set.

use std::collections::HashSet;

/// Fraction of `relevant` that appear anywhere in `ranked[..k]`.
/// `0.0` if `relevant` is empty.
pub fn recall_at_k(ranked: &[String], relevant: &HashSet<String>, k: usize) -> f32 {
    if relevant.is_empty() {
        return 0.0;
    }
    let hits = ranked.iter().take(k).filter(|qid| relevant.contains(*qid)).count();
    hits as f32 / relevant.len() as f32
}

/// Fraction of `ranked[..k]` that are relevant. `0.0` if `k` is `0`.
pub fn precision_at_k(ranked: &[String], relevant: &HashSet<String>, k: usize) -> f32 {
    if k == 0 {
        return 0.0;
    }
    let window = ranked.iter().take(k);
    let hits = window.filter(|qid| relevant.contains(*qid)).count();
    hits as f32 / k as f32
}

/// `1 / (rank + 1)` for the first relevant id within `ranked[..k]`, else `0.0`.
pub fn reciprocal_rank(ranked: &[String], relevant: &HashSet<String>, k: usize) -> f32 {
    for (i, qid) in ranked.iter().take(k).enumerate() {
        if relevant.contains(qid) {
            return 1.0 / (i as f32 + 1.0);
        }
    }
    0.0
}

/// Mean precision at each rank where a relevant id occurs, within `ranked[..k]`.
pub fn average_precision(ranked: &[String], relevant: &HashSet<String>, k: usize) -> f32 {
    if relevant.is_empty() {
        return 0.0;
    }
    let mut hits = 0usize;
    let mut sum = 0.0f32;
    for (i, qid) in ranked.iter().take(k).enumerate() {
        if relevant.contains(qid) {
            hits += 1;
            sum += hits as f32 / (i as f32 + 1.0);
        }
    }
    if hits == 0 {
        0.0
    } else {
        sum / relevant.len() as f32
    }
}

/// Binary-relevance normalized discounted cumulative gain within `ranked[..k]`.
/// The ideal DCG assumes `min(k, |relevant|)` consecutive relevant hits at the
/// top. `0.0` if `relevant` is empty.
pub fn ndcg_at_k(ranked: &[String], relevant: &HashSet<String>, k: usize) -> f32 {
    if relevant.is_empty() {
        return 0.0;
    }
    let dcg: f32 = ranked
        .iter()
        .take(k)
        .enumerate()
        .filter(|(_, qid)| relevant.contains(*qid))
        .map(|(i, _)| 1.0 / ((i as f32 + 2.0).log2()))
        .sum();
    let ideal_count = k.min(relevant.len());
    let idcg: f32 = (0..ideal_count).map(|i| 1.0 / ((i as f32 + 2.0).log2())).sum();
    if idcg > 0.0 {
        dcg / idcg
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn relset(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn recall_counts_hits_within_k() {
        let r = ranked(&["a", "b", "c"]);
        let rel = relset(&["b", "z"]);
        assert!((recall_at_k(&r, &rel, 3) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn recall_with_no_relevant_is_zero() {
        let r = ranked(&["a"]);
        assert_eq!(recall_at_k(&r, &HashSet::new(), 10), 0.0);
    }

    #[test]
    fn reciprocal_rank_finds_first_hit() {
        let r = ranked(&["a", "b", "c"]);
        let rel = relset(&["c"]);
        assert!((reciprocal_rank(&r, &rel, 10) - (1.0 / 3.0)).abs() < 1e-6);
    }

    #[test]
    fn reciprocal_rank_no_hit_is_zero() {
        let r = ranked(&["a", "b"]);
        let rel = relset(&["z"]);
        assert_eq!(reciprocal_rank(&r, &rel, 10), 0.0);
    }

    #[test]
    fn ndcg_perfect_ranking_is_one() {
        let r = ranked(&["a", "b", "c"]);
        let rel = relset(&["a", "b"]);
        assert!((ndcg_at_k(&r, &rel, 3) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn ndcg_worst_ranking_is_less_than_one() {
        let r = ranked(&["c", "b", "a"]);
        let rel = relset(&["a"]);
        assert!(ndcg_at_k(&r, &rel, 3) < 1.0);
    }

    #[test]
    fn average_precision_rewards_early_hits() {
        let early = ranked(&["a", "z", "z"]);
        let late = ranked(&["z", "z", "a"]);
        let rel = relset(&["a"]);
        assert!(average_precision(&early, &rel, 3) > average_precision(&late, &rel, 3));
    }
}
