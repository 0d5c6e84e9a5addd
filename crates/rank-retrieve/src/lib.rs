//! First-stage retrieval primitives: text normalization, content fingerprints,
//! a deterministic hash embedder, an Okapi BM25 inverted index, and a
//! brute-force cosine vector index.
//!
//! These pieces sit at the base of the pipeline this workspace builds:
//! a bank of a few thousand questions is narrowed by BM25 and dense retrieval,
//! fused by `rank-fusion`, reranked by `rank-rerank`, and the resulting
//! handful of candidates is what the caller sees.
//!
//! ```
//! use rank_retrieve::prelude::*;
//!
//! let mut bm25 = InvertedIndex::new();
//! bm25.add_documents(&[BmRow { qid: "q1".into(), terms: tokenize("derivative of a polynomial") }]);
//! let hits = bm25.search(&tokenize("derivative"), 10).unwrap();
//! assert_eq!(hits[0].0, "q1");
//! ```

pub mod bm25;
pub mod embed;
pub mod error;
pub mod fingerprint;
pub mod text;
pub mod vector;

pub use embed::Embedder;
pub use error::RetrieveError;

pub mod prelude {
    pub use crate::bm25::{Bm25Params, BmRow, InvertedIndex};
    pub use crate::embed::{DeterministicHashEmbedder, Embedder};
    pub use crate::error::RetrieveError;
    pub use crate::fingerprint::{exact_hash, template_hash};
    pub use crate::text::{clamp01, cosine_similarity, normalize_template_text, normalize_text, stable_hash, tokenize};
    pub use crate::vector::VectorIndex;
}
