//! Entity types exchanged at the engine boundary.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DuplicateClass {
    #[serde(rename = "duplicate")]
    Duplicate,
    #[serde(rename = "near-duplicate")]
    NearDuplicate,
    #[serde(rename = "similar")]
    Similar,
    #[serde(rename = "related")]
    Related,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DedupStatus {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "exact-duplicate")]
    ExactDuplicate,
    #[serde(rename = "near-duplicate")]
    NearDuplicate,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuestionImage {
    #[serde(rename = "imageId")]
    pub image_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, rename = "ocrText", skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, rename = "imageVector", skip_serializing_if = "Option::is_none")]
    pub image_vector: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuestionSource {
    #[serde(default, rename = "fileId", skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    #[serde(default, rename = "questionNo", skip_serializing_if = "Option::is_none")]
    pub question_no: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuestionDocument {
    pub qid: String,
    pub stem: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default)]
    pub images: Vec<QuestionImage>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub fingerprints: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<QuestionSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestedQuestion {
    pub question: QuestionDocument,
    pub status: DedupStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_qid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// A single raw question row as supplied to `ingest`, before normalization.
/// Mirrors the duck-typed dict the reference implementation accepts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawQuestionRow {
    #[serde(default)]
    pub qid: Option<String>,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub stem: Option<String>,
    #[serde(default)]
    pub stem_md: Option<String>,
    #[serde(default)]
    pub options: Option<serde_json::Value>,
    #[serde(default)]
    pub answer: Option<serde_json::Value>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub explanation_md: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<RawImageRow>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    pub area: Option<serde_json::Value>,
    #[serde(default)]
    pub subject: Option<serde_json::Value>,
    #[serde(default)]
    pub topic: Option<serde_json::Value>,
    #[serde(default)]
    pub difficulty: Option<serde_json::Value>,
    #[serde(default, rename = "skillIds")]
    pub skill_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImageRow {
    #[serde(default, rename = "imageId")]
    pub image_id: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "ocrText")]
    pub ocr_text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default, rename = "imageVector")]
    pub image_vector: Option<Vec<f32>>,
}

/// A raw file row whose content is handed to the plain-text parser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawFileRow {
    #[serde(default, rename = "fileId")]
    pub file_id: Option<String>,
    #[serde(default, rename = "mimeType")]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub scanned: Option<bool>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestionInput {
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub questions: Vec<RawQuestionRow>,
    #[serde(default)]
    pub files: Vec<RawFileRow>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_vector: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(default)]
    pub filters: HashMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_m: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_n: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResult {
    pub qid: String,
    pub score: f32,
    pub bm25_score: Option<f32>,
    /// The dense channel score the reranker was fed, defaulting to `0.0`
    /// rather than `None` when the candidate had no dense hit — matching the
    /// reference engine's `dense_map.get(qid, 0.0)` default.
    pub dense_score: Option<f32>,
    pub image_score: Option<f32>,
    pub rerank_score: f32,
    pub duplicate_class: DuplicateClass,
    pub reason: String,
    pub question: QuestionDocument,
}

#[derive(Debug, Clone, Serialize)]
pub struct RetrievalResponse {
    pub took_ms: u64,
    pub query: QueryInput,
    pub counts: HashMap<String, usize>,
    pub results: Vec<RetrievalResult>,
}

#[derive(Debug, Clone)]
pub struct EvalRecord {
    pub query_qid: String,
    pub relevant_qids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvalMetrics {
    pub recall_at_k: f32,
    pub mrr_at_10: f32,
    pub ndcg_at_20: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RAGConfig {
    pub dense_dim: usize,
    pub bm25_top_k: usize,
    pub dense_top_k: usize,
    pub image_top_k: usize,
    pub rrf_k: u32,
    pub sparse_weight: f32,
    pub dense_weight: f32,
    pub image_weight: f32,
    pub rrf_weight: f32,
    pub rerank_top_m: usize,
    pub final_top_n: usize,
    pub near_duplicate_threshold: f32,
    pub duplicate_threshold: f32,
}

impl Default for RAGConfig {
    fn default() -> Self {
        Self {
            dense_dim: 512,
            bm25_top_k: 300,
            dense_top_k: 300,
            image_top_k: 300,
            rrf_k: 60,
            sparse_weight: 0.45,
            dense_weight: 0.45,
            image_weight: 0.10,
            rrf_weight: 0.15,
            rerank_top_m: 200,
            final_top_n: 20,
            near_duplicate_threshold: 0.85,
            duplicate_threshold: 0.95,
        }
    }
}
