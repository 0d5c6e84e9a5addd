//! Pair-wise reranking of a (query, document) pair.
//!
//! Like `rank-fusion`, this crate has no teacher source in the pack; it is
//! grounded on the reference Python `reranker.py` (see `DESIGN.md`).

pub mod error;

pub use error::RerankError;

use rank_retrieve::text::{clamp01, tokenize};
use rank_retrieve::Embedder;

fn token_overlap(a: &str, b: &str) -> f32 {
    use std::collections::HashSet;
    let sa: HashSet<String> = tokenize(a).into_iter().collect();
    let sb: HashSet<String> = tokenize(b).into_iter().collect();
    if sa.is_empty() || sb.is_empty() {
        return 0.0;
    }
    let inter = sa.intersection(&sb).count();
    inter as f32 / (sa.len().min(sb.len()).max(1)) as f32
}

/// Blends lexical overlap, embedding cosine similarity, and an upstream
/// dense score into a single `[0, 1]` relevance estimate.
///
/// `dense_score` should be `0.0` when the candidate had no dense channel
/// score, matching the engine's convention of feeding a default rather than
/// skipping the dense term entirely.
pub fn rerank_pair_score(query_text: &str, doc_text: &str, dense_score: f32, embedder: &dyn Embedder) -> f32 {
    let overlap = token_overlap(query_text, doc_text);
    let qv = embedder.encode(query_text);
    let dv = embedder.encode(doc_text);
    let cos: f32 = qv.iter().zip(dv.iter()).map(|(x, y)| x * y).sum();
    clamp01(0.5 * overlap + 0.3 * clamp01((cos + 1.0) / 2.0) + 0.2 * clamp01((dense_score + 1.0) / 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rank_retrieve::embed::DeterministicHashEmbedder;

    #[test]
    fn identical_text_scores_highly() {
        let e = DeterministicHashEmbedder::new(64);
        let s = rerank_pair_score("derivative of x squared", "derivative of x squared", 1.0, &e);
        assert!(s > 0.9, "expected high score, got {s}");
    }

    #[test]
    fn unrelated_text_scores_low() {
        let e = DeterministicHashEmbedder::new(64);
        let s = rerank_pair_score("derivative of x squared", "history of the roman empire", 0.0, &e);
        assert!(s < 0.5, "expected low score, got {s}");
    }

    #[test]
    fn empty_strings_do_not_panic() {
        let e = DeterministicHashEmbedder::new(64);
        let s = rerank_pair_score("", "", 0.0, &e);
        assert!((0.0..=1.0).contains(&s));
    }

    #[test]
    fn score_is_clamped_to_unit_interval() {
        let e = DeterministicHashEmbedder::new(64);
        let s = rerank_pair_score("a", "a", 1.0, &e);
        assert!(s <= 1.0);
    }
}
