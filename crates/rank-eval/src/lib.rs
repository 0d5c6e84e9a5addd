//! Binary-relevance ranking metrics over a caller-supplied ranked id list.
//!
//! This crate, like `rank-fusion` and `rank-rerank`, has no teacher source in
//! the pack; it is grounded on the metric accumulation embedded in the
//! reference Python engine's `evaluate` method (see `DESIGN.md`). Only the
//! binary-relevance family is implemented — the teacher's prelude also names
//! a `graded` module (`compute_ndcg`, `compute_err` over graded relevance),
//! which has no caller anywhere in this engine and was not added.

pub mod binary;

pub mod prelude {
    pub use crate::binary::{average_precision, ndcg_at_k, precision_at_k, recall_at_k, reciprocal_rank};
}
