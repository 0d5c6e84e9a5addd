//! The hybrid retrieval/deduplication engine: bank state, input normalization,
//! the dedup state machine, filtering, and orchestration across the
//! retrieve/fusion/rerank stages.

use crate::error::EngineError;
use crate::parser::parse_questions_from_file;
use crate::persistence::{load_questions_jsonl, save_questions_jsonl};
use crate::types::*;
use rank_fusion::{fuse_hybrid_scores, FusionWeights, ScoredId};
use rank_rerank::rerank_pair_score;
use rank_retrieve::bm25::{BmRow, InvertedIndex};
use rank_retrieve::embed::DeterministicHashEmbedder;
use rank_retrieve::fingerprint::{exact_hash, template_hash};
use rank_retrieve::text::tokenize;
use rank_retrieve::vector::{check_dimension, VectorIndex};
use rank_retrieve::Embedder;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Instant;

struct StoredVectors {
    stem: Vec<f32>,
    exp: Option<Vec<f32>>,
}

pub struct Engine {
    config: RAGConfig,
    embedder: Box<dyn Embedder>,
    docs: HashMap<String, QuestionDocument>,
    vectors: HashMap<String, StoredVectors>,
    exact_hash_map: HashMap<String, String>,
    template_hash_map: HashMap<String, Vec<String>>,
    bm25: InvertedIndex,
    stem_index: VectorIndex,
    explanation_index: VectorIndex,
    image_index: VectorIndex,
    image_owner: HashMap<String, String>,
}

impl Engine {
    pub fn new(config: RAGConfig) -> Self {
        let embedder = Box::new(DeterministicHashEmbedder::new(config.dense_dim));
        Self::with_embedder(config, embedder)
    }

    pub fn with_embedder(config: RAGConfig, embedder: Box<dyn Embedder>) -> Self {
        Self {
            config,
            embedder,
            docs: HashMap::new(),
            vectors: HashMap::new(),
            exact_hash_map: HashMap::new(),
            template_hash_map: HashMap::new(),
            bm25: InvertedIndex::new(),
            stem_index: VectorIndex::new(),
            explanation_index: VectorIndex::new(),
            image_index: VectorIndex::new(),
            image_owner: HashMap::new(),
        }
    }

    pub fn config(&self) -> &RAGConfig {
        &self.config
    }

    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    // ---- public API --------------------------------------------------

    pub fn ingest(&mut self, input: IngestionInput) -> Vec<IngestedQuestion> {
        log::info!("ingest start");
        let normalized = self.normalize_input(input);
        log::info!("normalized incoming questions: {}", normalized.len());
        let mut out = Vec::with_capacity(normalized.len());

        for q in normalized {
            if let Some(matched) = q
                .fingerprints
                .get("exact_hash")
                .and_then(|h| self.exact_hash_map.get(h))
                .cloned()
            {
                out.push(IngestedQuestion {
                    question: q,
                    status: DedupStatus::ExactDuplicate,
                    matched_qid: Some(matched),
                    score: Some(1.0),
                });
                continue;
            }

            let near = self.find_near_duplicate(&q);
            if let Some((matched_qid, score)) = &near {
                if *score >= self.config.near_duplicate_threshold {
                    out.push(IngestedQuestion {
                        question: q.clone(),
                        status: DedupStatus::NearDuplicate,
                        matched_qid: Some(matched_qid.clone()),
                        score: Some(*score),
                    });
                    self.store_question(q);
                    continue;
                }
            }
            out.push(IngestedQuestion { question: q.clone(), status: DedupStatus::New, matched_qid: None, score: None });
            self.store_question(q);
        }

        self.rebuild_indexes();
        log::info!("ingest done: total_docs={}", self.docs.len());
        out
    }

    pub fn retrieve(&self, query: QueryInput) -> RetrievalResponse {
        let started = Instant::now();
        log::info!(
            "retrieve start: text_len={} question_id={:?}",
            query.text.as_deref().unwrap_or("").len(),
            query.question_id
        );
        let query_text = self.resolve_query_text(&query);
        let top_k = query.top_k.unwrap_or(self.config.bm25_top_k);
        let top_m = query.top_m.unwrap_or(self.config.rerank_top_m);
        let top_n = query.top_n.unwrap_or(self.config.final_top_n);

        let allowed = self.filter_qids(&query);
        if allowed.is_empty() {
            log::warn!("retrieve empty due to filters: {:?}", query.filters);
            let counts = [
                ("bm25Candidates", 0),
                ("denseCandidates", 0),
                ("imageCandidates", 0),
                ("fusedCandidates", 0),
                ("rerankedCandidates", 0),
                ("finalResults", 0),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
            return RetrievalResponse {
                took_ms: started.elapsed().as_millis() as u64,
                query,
                counts,
                results: Vec::new(),
            };
        }

        let bm25_hits = self.score_sparse(&query_text, top_k, &allowed);
        let q_vector = if query_text.is_empty() { Vec::new() } else { self.embedder.encode(&query_text) };
        let dense_hits = self.score_dense(&q_vector, self.config.dense_top_k, &allowed);
        let image_hits = self.score_image(query.image_vector.as_deref(), self.config.image_top_k, &allowed);

        let mut weights = FusionWeights {
            sparse_weight: self.config.sparse_weight,
            dense_weight: self.config.dense_weight,
            image_weight: self.config.image_weight,
            rrf_weight: self.config.rrf_weight,
            rrf_k: self.config.rrf_k,
        };
        if let Err(e) = weights.validate() {
            log::warn!("{e}; clamping negative fusion weights to 0");
            weights.sparse_weight = weights.sparse_weight.max(0.0);
            weights.dense_weight = weights.dense_weight.max(0.0);
            weights.image_weight = weights.image_weight.max(0.0);
            weights.rrf_weight = weights.rrf_weight.max(0.0);
        }
        let fused = fuse_hybrid_scores(&bm25_hits, &dense_hits, &image_hits, weights, query.image_vector.is_some());
        let rerank_candidates: Vec<&ScoredId> = fused.iter().take(top_m).collect();

        let bm25_map: HashMap<&str, f32> = bm25_hits.iter().map(|r| (r.qid.as_str(), r.score)).collect();
        let dense_map: HashMap<&str, f32> = dense_hits.iter().map(|r| (r.qid.as_str(), r.score)).collect();
        let image_map: HashMap<&str, f32> = image_hits.iter().map(|r| (r.qid.as_str(), r.score)).collect();

        struct Reranked {
            qid: String,
            score: f32,
            rerank_score: f32,
            bm25_score: Option<f32>,
            dense_score: f32,
            image_score: Option<f32>,
            question: QuestionDocument,
        }

        let mut reranked: Vec<Reranked> = Vec::new();
        for cand in rerank_candidates {
            let Some(doc) = self.docs.get(&cand.qid) else { continue };
            let mut parts = vec![doc.stem.clone()];
            parts.extend(doc.options.iter().cloned());
            parts.push(doc.explanation.clone().unwrap_or_default());
            let doc_text = parts.join("\n");
            let dense_score = dense_map.get(doc.qid.as_str()).copied().unwrap_or(0.0);
            let rr = rerank_pair_score(&query_text, &doc_text, dense_score, self.embedder.as_ref());
            reranked.push(Reranked {
                qid: doc.qid.clone(),
                score: cand.score,
                rerank_score: rr,
                bm25_score: bm25_map.get(doc.qid.as_str()).copied(),
                dense_score,
                image_score: image_map.get(doc.qid.as_str()).copied(),
                question: doc.clone(),
            });
        }
        reranked.sort_unstable_by(|a, b| b.rerank_score.partial_cmp(&a.rerank_score).unwrap_or(std::cmp::Ordering::Equal));

        let mut results = Vec::new();
        for row in reranked.iter().take(top_n) {
            results.push(RetrievalResult {
                qid: row.qid.clone(),
                score: row.score,
                bm25_score: row.bm25_score,
                dense_score: Some(row.dense_score),
                image_score: row.image_score,
                rerank_score: row.rerank_score,
                duplicate_class: Self::classify(&self.config, row.rerank_score),
                reason: Self::reason_text(row.bm25_score, Some(row.dense_score), row.image_score, row.rerank_score),
                question: row.question.clone(),
            });
        }

        let counts = [
            ("bm25Candidates", bm25_hits.len()),
            ("denseCandidates", dense_hits.len()),
            ("imageCandidates", image_hits.len()),
            ("fusedCandidates", fused.len()),
            ("rerankedCandidates", reranked.len()),
            ("finalResults", results.len()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        RetrievalResponse { took_ms: started.elapsed().as_millis() as u64, query, counts, results }
    }

    pub fn evaluate(&self, records: &[EvalRecord]) -> EvalMetrics {
        if records.is_empty() {
            return EvalMetrics { recall_at_k: 0.0, mrr_at_10: 0.0, ndcg_at_20: 0.0 };
        }
        let mut recall_hits = 0usize;
        let mut recall_total = 0usize;
        let mut mrr_sum = 0f32;
        let mut ndcg_sum = 0f32;

        for rec in records {
            let Some(source) = self.docs.get(&rec.query_qid) else { continue };
            let resp = self.retrieve(QueryInput { text: Some(source.stem.clone()), top_n: Some(200), ..Default::default() });
            let ranked: Vec<String> = resp.results.iter().map(|r| r.qid.clone()).collect();
            let relevant: HashSet<String> = rec.relevant_qids.iter().cloned().collect();
            if relevant.is_empty() {
                continue;
            }
            recall_hits += ranked.iter().take(200).filter(|q| relevant.contains(*q)).count();
            recall_total += relevant.len();
            mrr_sum += rank_eval::binary::reciprocal_rank(&ranked, &relevant, 10);
            ndcg_sum += rank_eval::binary::ndcg_at_k(&ranked, &relevant, 20);
        }

        let denom = records.len().max(1) as f32;
        EvalMetrics {
            recall_at_k: if recall_total > 0 { recall_hits as f32 / recall_total as f32 } else { 0.0 },
            mrr_at_10: mrr_sum / denom,
            ndcg_at_20: ndcg_sum / denom,
        }
    }

    pub fn save_local_bank(&self, path: impl AsRef<Path>) -> Result<usize, EngineError> {
        let path = path.as_ref();
        let count = save_questions_jsonl(path, self.docs.values().cloned())?;
        log::info!("saved local bank: path={} count={count}", path.display());
        Ok(count)
    }

    pub fn load_local_bank(&mut self, path: impl AsRef<Path>) -> Result<usize, EngineError> {
        let path = path.as_ref();
        let rows = load_questions_jsonl(path)?;
        if rows.is_empty() {
            log::warn!("local bank load: file empty or not found. path={}", path.display());
            return Ok(0);
        }
        self.docs.clear();
        self.vectors.clear();
        self.exact_hash_map.clear();
        self.template_hash_map.clear();
        let payload = IngestionInput { version: None, questions: rows.into_iter().map(document_to_raw_row).collect(), files: Vec::new() };
        self.ingest(payload);
        log::info!("loaded local bank: path={} count={}", path.display(), self.docs.len());
        Ok(self.docs.len())
    }

    pub fn to_json(&self) -> String {
        #[derive(serde::Serialize)]
        struct Dump<'a> {
            config: &'a RAGConfig,
            docs: Vec<&'a QuestionDocument>,
        }
        let dump = Dump { config: &self.config, docs: self.docs.values().collect() };
        serde_json::to_string_pretty(&dump).expect("bank dump serialization cannot fail")
    }

    // ---- normalization -------------------------------------------------

    fn normalize_input(&self, input: IngestionInput) -> Vec<QuestionDocument> {
        let mut out = Vec::new();
        for (i, row) in input.questions.into_iter().enumerate() {
            let stem = Self::resolve_stem(&row);
            let qid = row
                .qid
                .clone()
                .filter(|s| !s.is_empty())
                .or_else(|| row.id.as_ref().map(|id| format!("q_{}", value_to_plain_string(id))))
                .unwrap_or_else(|| format!("q_{}", rank_retrieve::text::stable_hash(&format!("{stem}:{i}"))));
            let options = Self::normalize_options(row.options.as_ref());
            let explanation = Self::resolve_explanation(&row);
            let answer = row.answer.as_ref().and_then(Self::normalize_answer);
            let images = self.normalize_images(row.images.clone().unwrap_or_default(), &qid);
            let metadata = Self::normalize_metadata(&row);
            let fingerprints = HashMap::from([
                ("exact_hash".to_string(), exact_hash(&stem, &options, answer.as_deref())),
                ("template_hash".to_string(), template_hash(&stem)),
            ]);
            out.push(QuestionDocument {
                qid,
                stem,
                options,
                answer,
                explanation,
                images,
                tags: row.tags.clone().unwrap_or_default(),
                metadata,
                fingerprints,
                source: None,
            });
        }

        for file_row in input.files {
            let file_id = file_row.file_id.clone().unwrap_or_else(|| "f".to_string());
            let content = file_row.content.clone().unwrap_or_default();
            for parsed in parse_questions_from_file(&content) {
                let qid = format!(
                    "q_{}",
                    rank_retrieve::text::stable_hash(&format!("{file_id}:{}:{}", parsed.source_question_no, parsed.stem))
                );
                let mut metadata = HashMap::new();
                metadata.insert("sourceMimeType".to_string(), file_row.mime_type.clone().map(Value::String).unwrap_or(Value::Null));
                metadata.insert("scanned".to_string(), Value::Bool(file_row.scanned.unwrap_or(false)));
                out.push(QuestionDocument {
                    qid,
                    stem: parsed.stem.clone(),
                    options: parsed.options.clone(),
                    answer: parsed.answer.clone(),
                    explanation: parsed.explanation.clone(),
                    images: Vec::new(),
                    tags: Vec::new(),
                    metadata,
                    fingerprints: HashMap::from([
                        ("exact_hash".to_string(), exact_hash(&parsed.stem, &parsed.options, parsed.answer.as_deref())),
                        ("template_hash".to_string(), template_hash(&parsed.stem)),
                    ]),
                    source: Some(QuestionSource { file_id: Some(file_id.clone()), question_no: Some(parsed.source_question_no) }),
                });
            }
        }
        out
    }

    fn resolve_stem(row: &RawQuestionRow) -> String {
        row.stem.clone().or_else(|| row.stem_md.clone()).unwrap_or_default().trim().to_string()
    }

    fn resolve_explanation(row: &RawQuestionRow) -> Option<String> {
        let value = row.explanation.clone().or_else(|| row.explanation_md.clone())?;
        let trimmed = value.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }

    fn normalize_options(value: Option<&Value>) -> Vec<String> {
        match value {
            Some(Value::Object(map)) => ["A", "B", "C", "D"]
                .iter()
                .filter_map(|k| map.get(*k))
                .map(value_to_plain_string)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::Array(arr)) => arr
                .iter()
                .map(value_to_plain_string)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    fn normalize_answer(value: &Value) -> Option<String> {
        let text = value_to_plain_string(value).trim().to_uppercase();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn normalize_metadata(row: &RawQuestionRow) -> HashMap<String, Value> {
        let mut metadata = row.metadata.clone().unwrap_or_default();
        if let Some(id) = &row.id {
            metadata.entry("source_id".to_string()).or_insert_with(|| id.clone());
        }
        for (key, value) in [("area", &row.area), ("subject", &row.subject), ("topic", &row.topic), ("difficulty", &row.difficulty)] {
            if let Some(v) = value {
                metadata.entry(key.to_string()).or_insert_with(|| v.clone());
            }
        }
        if let Some(skills) = &row.skill_ids {
            metadata
                .entry("skillIds".to_string())
                .or_insert_with(|| Value::Array(skills.iter().cloned().map(Value::String).collect()));
        }
        metadata
    }

    fn normalize_images(&self, rows: Vec<RawImageRow>, qid: &str) -> Vec<QuestionImage> {
        rows.into_iter()
            .enumerate()
            .map(|(idx, img)| {
                let image_id = img.image_id.filter(|s| !s.is_empty()).unwrap_or_else(|| format!("{qid}_img_{}", idx + 1));
                let image_vector = match &img.image_vector {
                    Some(v) if !v.is_empty() => {
                        if let Err(e) = check_dimension(v, self.config.dense_dim) {
                            log::warn!("image vector dimension mismatch: qid={qid} image_id={image_id} {e}");
                        }
                        img.image_vector.clone()
                    }
                    _ => {
                        let text = format!("{}\n{}", img.caption.clone().unwrap_or_default(), img.ocr_text.clone().unwrap_or_default());
                        Some(self.embedder.encode(&text))
                    }
                };
                QuestionImage { image_id, path: img.path, ocr_text: img.ocr_text, caption: img.caption, image_vector }
            })
            .collect()
    }

    // ---- dedup / storage ------------------------------------------------

    fn find_near_duplicate(&self, q: &QuestionDocument) -> Option<(String, f32)> {
        let mut parts = vec![q.stem.clone()];
        parts.extend(q.options.iter().cloned());
        let qv = self.embedder.encode(&parts.join("\n"));
        let hits = self.stem_index.search(&qv, 5);
        hits.into_iter().next()
    }

    fn store_question(&mut self, q: QuestionDocument) {
        let exact = q.fingerprints.get("exact_hash").cloned().unwrap_or_default();
        let template = q.fingerprints.get("template_hash").cloned().unwrap_or_default();
        self.exact_hash_map.insert(exact, q.qid.clone());
        self.template_hash_map.entry(template).or_default().push(q.qid.clone());

        let mut parts = vec![q.stem.clone()];
        parts.extend(q.options.iter().cloned());
        let stem_vec = self.embedder.encode(&parts.join("\n"));
        let exp_vec = q.explanation.as_deref().map(|e| self.embedder.encode(e));
        self.vectors.insert(q.qid.clone(), StoredVectors { stem: stem_vec, exp: exp_vec });
        self.docs.insert(q.qid.clone(), q);
    }

    fn rebuild_indexes(&mut self) {
        self.bm25 = InvertedIndex::new();
        self.stem_index = VectorIndex::new();
        self.explanation_index = VectorIndex::new();
        self.image_index = VectorIndex::new();
        self.image_owner.clear();

        let bm_rows: Vec<BmRow> = self
            .docs
            .values()
            .map(|d| {
                let metadata_json = serde_json::to_string(&d.metadata).unwrap_or_default();
                let ocr_texts = d.images.iter().map(|i| i.ocr_text.clone().unwrap_or_default()).collect::<Vec<_>>().join(" ");
                let captions = d.images.iter().map(|i| i.caption.clone().unwrap_or_default()).collect::<Vec<_>>().join(" ");
                let mut parts = vec![d.stem.clone(), d.stem.clone()];
                parts.extend(d.options.iter().cloned());
                parts.push(d.explanation.clone().unwrap_or_default());
                parts.push(ocr_texts);
                parts.push(captions);
                parts.push(metadata_json);
                BmRow { qid: d.qid.clone(), terms: tokenize(&parts.join("\n")) }
            })
            .collect();
        self.bm25.add_documents(&bm_rows);

        let stem_rows: Vec<(String, Vec<f32>)> = self.docs.keys().filter_map(|qid| self.vectors.get(qid).map(|v| (qid.clone(), v.stem.clone()))).collect();
        self.stem_index.upsert(stem_rows);

        let exp_rows: Vec<(String, Vec<f32>)> = self
            .docs
            .keys()
            .filter_map(|qid| self.vectors.get(qid).and_then(|v| v.exp.clone()).filter(|v| !v.is_empty()).map(|v| (qid.clone(), v)))
            .collect();
        self.explanation_index.upsert(exp_rows);

        let mut image_rows = Vec::new();
        for d in self.docs.values() {
            for img in &d.images {
                if let Some(vector) = &img.image_vector {
                    if !vector.is_empty() {
                        image_rows.push((img.image_id.clone(), vector.clone()));
                        self.image_owner.insert(img.image_id.clone(), d.qid.clone());
                    }
                }
            }
        }
        self.image_index.upsert(image_rows);
    }

    // ---- retrieval helpers ----------------------------------------------

    fn resolve_query_text(&self, query: &QueryInput) -> String {
        if let Some(text) = &query.text {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
        if let Some(qid) = &query.question_id {
            return self.docs.get(qid).map(|d| d.stem.clone()).unwrap_or_default();
        }
        String::new()
    }

    fn filter_qids(&self, query: &QueryInput) -> HashSet<String> {
        let f = &query.filters;
        self.docs
            .values()
            .filter(|d| {
                for key in ["subject", "gradeLevel", "difficulty", "questionType", "examBoard"] {
                    if let Some(fv) = f.get(key) {
                        if is_truthy(fv) && d.metadata.get(key) != Some(fv) {
                            return false;
                        }
                    }
                }
                if let Some(fv) = f.get("year") {
                    if !matches!(fv, Value::Null) && d.metadata.get("year") != Some(fv) {
                        return false;
                    }
                }
                true
            })
            .map(|d| d.qid.clone())
            .collect()
    }

    fn score_sparse(&self, query_text: &str, top_k: usize, allowed: &HashSet<String>) -> Vec<ScoredId> {
        if query_text.trim().is_empty() {
            return Vec::new();
        }
        let terms = tokenize(query_text);
        match self.bm25.search(&terms, top_k) {
            Ok(hits) => hits.into_iter().filter(|(qid, _)| allowed.contains(qid)).map(|(qid, score)| ScoredId { qid, score }).collect(),
            Err(_) => Vec::new(),
        }
    }

    fn score_dense(&self, q_vector: &[f32], top_k: usize, allowed: &HashSet<String>) -> Vec<ScoredId> {
        if q_vector.is_empty() {
            return Vec::new();
        }
        let stem_hits = self.stem_index.search(q_vector, top_k);
        let exp_hits = self.explanation_index.search(q_vector, top_k);
        let mut merged: HashMap<String, f32> = HashMap::new();
        for (qid, score) in stem_hits.into_iter().chain(exp_hits) {
            merged.entry(qid).and_modify(|s| *s = s.max(score)).or_insert(score);
        }
        let mut out: Vec<ScoredId> = merged
            .into_iter()
            .filter(|(qid, _)| allowed.contains(qid))
            .map(|(qid, score)| ScoredId { qid, score })
            .collect();
        out.sort_unstable_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        out.truncate(top_k);
        out
    }

    fn score_image(&self, image_vector: Option<&[f32]>, top_k: usize, allowed: &HashSet<String>) -> Vec<ScoredId> {
        let Some(image_vector) = image_vector.filter(|v| !v.is_empty()) else { return Vec::new() };
        let raw = self.image_index.search(image_vector, top_k);
        let mut merged: HashMap<String, f32> = HashMap::new();
        for (image_id, score) in raw {
            let Some(owner) = self.image_owner.get(&image_id) else { continue };
            if !allowed.contains(owner) {
                continue;
            }
            merged.entry(owner.clone()).and_modify(|s| *s = s.max(score)).or_insert(score);
        }
        let mut out: Vec<ScoredId> = merged.into_iter().map(|(qid, score)| ScoredId { qid, score }).collect();
        out.sort_unstable_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        out
    }

    fn classify(config: &RAGConfig, score: f32) -> DuplicateClass {
        if score >= config.duplicate_threshold {
            DuplicateClass::Duplicate
        } else if score >= config.near_duplicate_threshold {
            DuplicateClass::NearDuplicate
        } else if score >= 0.65 {
            DuplicateClass::Similar
        } else {
            DuplicateClass::Related
        }
    }

    fn reason_text(bm25_score: Option<f32>, dense_score: Option<f32>, image_score: Option<f32>, rerank_score: f32) -> String {
        let mut parts = Vec::new();
        if let Some(s) = bm25_score {
            parts.push(format!("bm25={s:.3}"));
        }
        if let Some(s) = dense_score {
            parts.push(format!("dense={s:.3}"));
        }
        if let Some(s) = image_score {
            parts.push(format!("image={s:.3}"));
        }
        parts.push(format!("rerank={rerank_score:.3}"));
        parts.join(", ")
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn value_to_plain_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Converts a stored `QuestionDocument` back into a raw row so
/// `load_local_bank` can replay it through the normal `ingest` path (which
/// recomputes vectors and re-derives fingerprints).
fn document_to_raw_row(doc: QuestionDocument) -> RawQuestionRow {
    RawQuestionRow {
        qid: Some(doc.qid),
        id: None,
        stem: Some(doc.stem),
        stem_md: None,
        options: Some(Value::Array(doc.options.into_iter().map(Value::String).collect())),
        answer: doc.answer.map(Value::String),
        explanation: doc.explanation,
        explanation_md: None,
        images: Some(
            doc.images
                .into_iter()
                .map(|i| RawImageRow { image_id: Some(i.image_id), path: i.path, ocr_text: i.ocr_text, caption: i.caption, image_vector: i.image_vector })
                .collect(),
        ),
        tags: Some(doc.tags),
        metadata: Some(doc.metadata),
        area: None,
        subject: None,
        topic: None,
        difficulty: None,
        skill_ids: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(rows: serde_json::Value) -> IngestionInput {
        serde_json::from_value(rows).expect("valid ingestion input")
    }

    #[test]
    fn classify_is_monotonic_in_score() {
        let config = RAGConfig::default();
        let order = |c: DuplicateClass| match c {
            DuplicateClass::Related => 0,
            DuplicateClass::Similar => 1,
            DuplicateClass::NearDuplicate => 2,
            DuplicateClass::Duplicate => 3,
        };
        let samples = [0.0, 0.3, 0.65, 0.7, 0.85, 0.9, 0.95, 0.99];
        for i in 1..samples.len() {
            let lo = Engine::classify(&config, samples[i - 1]);
            let hi = Engine::classify(&config, samples[i]);
            assert!(order(lo) <= order(hi), "{:?} then {:?} for {} -> {}", lo, hi, samples[i - 1], samples[i]);
        }
    }

    #[test]
    fn rebuild_indexes_is_idempotent() {
        let mut engine = Engine::new(RAGConfig::default());
        engine.ingest(input(serde_json::json!({
            "questions": [
                {"qid": "a", "stem": "what is the capital of spain", "options": ["madrid", "lisbon"], "answer": "A"},
                {"qid": "b", "stem": "what is the capital of portugal", "options": ["madrid", "lisbon"], "answer": "B"}
            ]
        })));
        let query = QueryInput { text: Some("capital of spain".to_string()), ..Default::default() };
        let before = engine.retrieve(query.clone());
        engine.rebuild_indexes();
        engine.rebuild_indexes();
        let after = engine.retrieve(query);
        assert_eq!(before.results.len(), after.results.len());
        for (b, a) in before.results.iter().zip(after.results.iter()) {
            assert_eq!(b.qid, a.qid);
            assert!((b.rerank_score - a.rerank_score).abs() < 1e-6);
        }
    }

    #[test]
    fn every_result_satisfies_the_requested_filter() {
        let mut engine = Engine::new(RAGConfig::default());
        engine.ingest(input(serde_json::json!({
            "questions": [
                {"qid": "a", "stem": "algebra question about factoring", "options": ["1", "2"], "metadata": {"subject": "Math"}},
                {"qid": "b", "stem": "algebra question about equations", "options": ["1", "2"], "metadata": {"subject": "Physics"}}
            ]
        })));
        let response = engine.retrieve(QueryInput {
            text: Some("algebra".to_string()),
            filters: [("subject".to_string(), serde_json::json!("Math"))].into_iter().collect(),
            ..Default::default()
        });
        assert!(!response.results.is_empty());
        for r in &response.results {
            assert_eq!(r.question.metadata.get("subject"), Some(&serde_json::json!("Math")));
        }
    }
}
