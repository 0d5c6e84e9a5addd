//! Brute-force cosine-similarity vector index keyed by opaque string ids.
//!
//! This engine's working set (thousands of questions, not billions) makes an
//! exhaustive scan fast enough that no approximate index is needed; see
//! `DESIGN.md` for why the teacher's HNSW/IVF-PQ/DiskANN family was not
//! carried into this crate.

use crate::error::RetrieveError;
use crate::text::cosine_similarity;
use std::collections::HashMap;

/// Validates `vector`'s length against `expected_dim`. `search` silently
/// skips vectors that don't match a query's dimension (by design, so a bank
/// mixing dimensions never crashes a query); this is the ingest-time check
/// callers use to surface a warning before a mismatched vector is stored.
pub fn check_dimension(vector: &[f32], expected_dim: usize) -> Result<(), RetrieveError> {
    if vector.len() != expected_dim {
        return Err(RetrieveError::DimensionMismatch { query_dim: expected_dim, doc_dim: vector.len() });
    }
    Ok(())
}

/// A flat store of vectors keyed by id, with brute-force cosine top-k search.
#[derive(Default)]
pub struct VectorIndex {
    vectors: HashMap<String, Vec<f32>>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self { vectors: HashMap::new() }
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Inserts or overwrites vectors for the given ids.
    pub fn upsert(&mut self, rows: impl IntoIterator<Item = (String, Vec<f32>)>) {
        for (id, vector) in rows {
            self.vectors.insert(id, vector);
        }
    }

    pub fn remove(&mut self, ids: &[String]) {
        for id in ids {
            self.vectors.remove(id);
        }
    }

    pub fn get(&self, id: &str) -> Option<&[f32]> {
        self.vectors.get(id).map(|v| v.as_slice())
    }

    /// Returns the `top_k` ids with the highest strictly-positive cosine
    /// similarity to `query`. Vectors whose length differs from `query`'s are
    /// silently skipped. Empty query returns an empty result.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<(String, f32)> {
        if query.is_empty() || top_k == 0 {
            return Vec::new();
        }
        let mut scored: Vec<(String, f32)> = self
            .vectors
            .iter()
            .filter(|(_, v)| v.len() == query.len())
            .map(|(id, v)| (id.clone(), cosine_similarity(query, v)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_unstable_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_returns_empty() {
        let mut idx = VectorIndex::new();
        idx.upsert([("a".to_string(), vec![1.0, 0.0])]);
        assert!(idx.search(&[], 5).is_empty());
    }

    #[test]
    fn ranks_closest_vector_first() {
        let mut idx = VectorIndex::new();
        idx.upsert([
            ("a".to_string(), vec![1.0, 0.0]),
            ("b".to_string(), vec![0.0, 1.0]),
        ]);
        let results = idx.search(&[1.0, 0.0], 5);
        assert_eq!(results[0].0, "a");
    }

    #[test]
    fn mismatched_dimension_is_skipped_not_errored() {
        let mut idx = VectorIndex::new();
        idx.upsert([
            ("a".to_string(), vec![1.0, 0.0, 0.0]),
            ("b".to_string(), vec![1.0, 0.0]),
        ]);
        let results = idx.search(&[1.0, 0.0], 5);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, "b");
    }

    #[test]
    fn top_k_truncates() {
        let mut idx = VectorIndex::new();
        idx.upsert([
            ("a".to_string(), vec![1.0, 0.0]),
            ("b".to_string(), vec![0.9, 0.1]),
            ("c".to_string(), vec![0.8, 0.2]),
        ]);
        assert_eq!(idx.search(&[1.0, 0.0], 2).len(), 2);
    }

    #[test]
    fn remove_drops_entries() {
        let mut idx = VectorIndex::new();
        idx.upsert([("a".to_string(), vec![1.0, 0.0])]);
        idx.remove(&["a".to_string()]);
        assert!(idx.is_empty());
    }

    #[test]
    fn check_dimension_flags_mismatch() {
        assert!(check_dimension(&[1.0, 0.0, 0.0], 3).is_ok());
        let err = check_dimension(&[1.0, 0.0], 3).unwrap_err();
        assert_eq!(err, RetrieveError::DimensionMismatch { query_dim: 3, doc_dim: 2 });
    }
}
