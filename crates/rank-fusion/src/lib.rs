//! Reciprocal rank fusion and hybrid weighted-sum fusion over per-channel
//! candidate rankings.
//!
//! This crate has no teacher source to build from directly (the workspace
//! this engine's pipeline layout is modeled on names `rank-fusion` as a
//! member but ships no files for it in this pack) — see `DESIGN.md` for the
//! grounding of each function here in the reference Python fusion/scoring
//! modules.

pub mod error;

pub use error::FusionError;

/// A scored candidate, as produced by any of the per-channel retrieval steps.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredId {
    pub qid: String,
    pub score: f32,
}

/// Weights for the hybrid fusion formula. Mirrors `RAGConfig`'s fusion
/// fields so the engine can pass its config straight through.
#[derive(Debug, Clone, Copy)]
pub struct FusionWeights {
    pub sparse_weight: f32,
    pub dense_weight: f32,
    pub image_weight: f32,
    pub rrf_weight: f32,
    pub rrf_k: u32,
}

impl FusionWeights {
    /// Checks that no weight is negative. `fuse_hybrid_scores` trusts this
    /// invariant rather than re-checking per call; callers building weights
    /// from untrusted config should validate once beforehand.
    pub fn validate(&self) -> Result<(), FusionError> {
        for (field, value) in [
            ("sparse_weight", self.sparse_weight),
            ("dense_weight", self.dense_weight),
            ("image_weight", self.image_weight),
            ("rrf_weight", self.rrf_weight),
        ] {
            if value < 0.0 {
                return Err(FusionError::NegativeWeight { field, value });
            }
        }
        Ok(())
    }
}

/// Reciprocal rank fusion over an arbitrary number of input rankings.
///
/// For each ranking list, and each row at 0-based position `i`, adds
/// `1 / (rrf_k + i + 1)` to that qid's score. Output is sorted descending,
/// not normalized or truncated.
pub fn rrf(rankings: &[Vec<ScoredId>], rrf_k: u32) -> Vec<ScoredId> {
    let mut merged: std::collections::HashMap<String, f32> = std::collections::HashMap::new();
    for ranking in rankings {
        for (i, row) in ranking.iter().enumerate() {
            *merged.entry(row.qid.clone()).or_insert(0.0) += 1.0 / (rrf_k as f32 + i as f32 + 1.0);
        }
    }
    let mut out: Vec<ScoredId> = merged.into_iter().map(|(qid, score)| ScoredId { qid, score }).collect();
    out.sort_unstable_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    out
}

/// Divides every score by the list's maximum; empty lists or a non-positive
/// maximum normalize to no entries at all (treated as zero by the caller).
fn normalize_by_max(rows: &[ScoredId]) -> std::collections::HashMap<String, f32> {
    let mut out = std::collections::HashMap::new();
    if rows.is_empty() {
        return out;
    }
    let max = rows.iter().map(|r| r.score).fold(f32::MIN, f32::max);
    if max <= 0.0 {
        return out;
    }
    for row in rows {
        out.insert(row.qid.clone(), row.score / max);
    }
    out
}

/// Combines sparse, dense, and image channel candidates into a single
/// ranked list. Reallocates the image weight into sparse/dense when the
/// query has no image vector, then max-normalizes each channel (including a
/// separately computed RRF ranking) before the weighted sum.
pub fn fuse_hybrid_scores(
    bm25_hits: &[ScoredId],
    dense_hits: &[ScoredId],
    image_hits: &[ScoredId],
    weights: FusionWeights,
    has_image_query: bool,
) -> Vec<ScoredId> {
    let mut sparse_w = weights.sparse_weight;
    let mut dense_w = weights.dense_weight;
    let mut image_w = weights.image_weight;
    if !has_image_query && image_w > 0.0 {
        let spare = image_w;
        sparse_w += spare * 0.5;
        dense_w += spare * 0.5;
        image_w = 0.0;
    }

    let bm25_norm = normalize_by_max(bm25_hits);
    let dense_norm = normalize_by_max(dense_hits);
    let image_norm = normalize_by_max(image_hits);
    let rrf_hits = rrf(&[bm25_hits.to_vec(), dense_hits.to_vec(), image_hits.to_vec()], weights.rrf_k);
    let rrf_norm = normalize_by_max(&rrf_hits);

    let mut qids: std::collections::HashSet<&str> = std::collections::HashSet::new();
    for rows in [bm25_hits, dense_hits, image_hits] {
        qids.extend(rows.iter().map(|r| r.qid.as_str()));
    }
    qids.extend(rrf_hits.iter().map(|r| r.qid.as_str()));

    let mut out: Vec<ScoredId> = qids
        .into_iter()
        .filter_map(|qid| {
            let score = sparse_w * bm25_norm.get(qid).copied().unwrap_or(0.0)
                + dense_w * dense_norm.get(qid).copied().unwrap_or(0.0)
                + image_w * image_norm.get(qid).copied().unwrap_or(0.0)
                + weights.rrf_weight * rrf_norm.get(qid).copied().unwrap_or(0.0);
            if score > 0.0 {
                Some(ScoredId { qid: qid.to_string(), score })
            } else {
                None
            }
        })
        .collect();
    out.sort_unstable_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    out
}

pub mod prelude {
    pub use crate::{fuse_hybrid_scores, rrf, FusionError, FusionWeights, ScoredId};
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sid(qid: &str, score: f32) -> ScoredId {
        ScoredId { qid: qid.to_string(), score }
    }

    #[test]
    fn rrf_rewards_consensus_across_rankings() {
        let sparse = vec![sid("a", 5.0), sid("b", 1.0)];
        let dense = vec![sid("b", 5.0), sid("a", 1.0)];
        let out = rrf(&[sparse, dense], 60);
        // a and b appear at rank 0 once each and rank 1 once each: tied.
        assert!((out[0].score - out[1].score).abs() < 1e-9);
    }

    #[test]
    fn fusion_reallocates_image_weight_when_no_image_query() {
        let weights = FusionWeights { sparse_weight: 0.45, dense_weight: 0.45, image_weight: 0.10, rrf_weight: 0.15, rrf_k: 60 };
        let out = fuse_hybrid_scores(&[sid("a", 1.0)], &[], &[], weights, false);
        // sparse_w becomes 0.5, bm25_norm["a"] = 1.0, rrf contributes too.
        assert!(out[0].score > 0.45);
    }

    #[test]
    fn fusion_keeps_image_weight_when_image_query_present() {
        let weights = FusionWeights { sparse_weight: 0.45, dense_weight: 0.45, image_weight: 0.10, rrf_weight: 0.15, rrf_k: 60 };
        let out = fuse_hybrid_scores(&[], &[], &[sid("a", 1.0)], weights, true);
        assert_eq!(out[0].qid, "a");
    }

    #[test]
    fn empty_channels_yield_empty_fusion() {
        let weights = FusionWeights { sparse_weight: 0.45, dense_weight: 0.45, image_weight: 0.10, rrf_weight: 0.15, rrf_k: 60 };
        let out = fuse_hybrid_scores(&[], &[], &[], weights, false);
        assert!(out.is_empty());
    }

    #[test]
    fn validate_rejects_negative_weights() {
        let weights = FusionWeights { sparse_weight: -0.1, dense_weight: 0.45, image_weight: 0.10, rrf_weight: 0.15, rrf_k: 60 };
        assert_eq!(weights.validate(), Err(FusionError::NegativeWeight { field: "sparse_weight", value: -0.1 }));
    }

    #[test]
    fn validate_accepts_non_negative_weights() {
        let weights = FusionWeights { sparse_weight: 0.0, dense_weight: 0.45, image_weight: 0.10, rrf_weight: 0.15, rrf_k: 60 };
        assert!(weights.validate().is_ok());
    }
}
