//! Hybrid retrieval and deduplication engine for multiple-choice question
//! banks.
//!
//! Ingested questions are fingerprinted for exact/near duplicates, indexed
//! for BM25 and dense retrieval, and a query runs through sparse + dense +
//! image candidate generation, [`rank_fusion`] fusion, and [`rank_rerank`]
//! pairwise reranking before classification into duplicate buckets.
//!
//! ```
//! use rank_rank::prelude::*;
//!
//! let mut engine = Engine::new(RAGConfig::default());
//! let input = IngestionInput {
//!     version: None,
//!     questions: vec![RawQuestionRow {
//!         stem: Some("What is 2 + 2?".to_string()),
//!         options: Some(serde_json::json!(["3", "4", "5", "6"])),
//!         answer: Some(serde_json::json!("B")),
//!         ..Default::default()
//!     }],
//!     files: Vec::new(),
//! };
//! let ingested = engine.ingest(input);
//! assert_eq!(ingested.len(), 1);
//! assert_eq!(ingested[0].status, DedupStatus::New);
//! ```

pub mod engine;
pub mod error;
pub mod parser;
pub mod persistence;
pub mod types;

pub use engine::Engine;
pub use error::EngineError;

pub mod prelude {
    pub use crate::engine::Engine;
    pub use crate::error::EngineError;
    pub use crate::parser::{parse_questions_from_file, parse_questions_from_plain_text, ParsedQuestion};
    pub use crate::persistence::{load_questions_jsonl, save_questions_jsonl};
    pub use crate::types::*;
}
