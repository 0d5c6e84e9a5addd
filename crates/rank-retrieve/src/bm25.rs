//! Okapi BM25 scoring over an in-memory inverted index.
//!
//! ```text
//! BM25(q, d) = Σ IDF(q_i) * (f(q_i, d) * (k1 + 1)) / (f(q_i, d) + k1 * (1 - b + b * |d|/avgdl))
//! ```
//!
//! Where `f(q_i, d)` is the frequency of term `q_i` in document `d`, `|d|` is
//! the document's length, `avgdl` is the average document length, and `k1`/`b`
//! are the usual saturation and length-normalization parameters.

use crate::RetrieveError;
use std::cell::RefCell;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

/// BM25 tuning parameters.
#[derive(Debug, Clone, Copy)]
pub struct Bm25Params {
    /// Term frequency saturation parameter. Default: 1.2.
    pub k1: f32,
    /// Length normalization parameter. Default: 0.75.
    pub b: f32,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// A document to add to the index: its id and already-tokenized terms.
pub struct BmRow {
    pub qid: String,
    pub terms: Vec<String>,
}

#[derive(PartialEq)]
struct FloatOrd(f32);
impl Eq for FloatOrd {}
impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(std::cmp::Ordering::Equal)
    }
}

/// In-memory inverted index supporting BM25 retrieval, keyed by opaque
/// string document ids (question ids).
pub struct InvertedIndex {
    postings: HashMap<String, HashMap<String, u32>>,
    doc_lengths: HashMap<String, u32>,
    avg_doc_length: f32,
    doc_frequencies: HashMap<String, u32>,
    precomputed_idf: RefCell<HashMap<String, f32>>,
    idf_computed_at_num_docs: RefCell<usize>,
}

impl Default for InvertedIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self {
            postings: HashMap::new(),
            doc_lengths: HashMap::new(),
            avg_doc_length: 0.0,
            doc_frequencies: HashMap::new(),
            precomputed_idf: RefCell::new(HashMap::new()),
            idf_computed_at_num_docs: RefCell::new(0),
        }
    }

    pub fn num_docs(&self) -> usize {
        self.doc_lengths.len()
    }

    /// Replaces the index contents with the given rows. Any previous
    /// document with a matching qid is dropped first.
    pub fn add_documents(&mut self, rows: &[BmRow]) {
        for row in rows {
            self.remove_one(&row.qid);
        }
        for row in rows {
            self.insert_one(&row.qid, &row.terms);
        }
        self.update_avg_doc_length();
        self.invalidate_idf();
    }

    pub fn remove_documents(&mut self, qids: &[String]) {
        for qid in qids {
            self.remove_one(qid);
        }
        self.update_avg_doc_length();
        self.invalidate_idf();
    }

    fn insert_one(&mut self, qid: &str, terms: &[String]) {
        self.doc_lengths.insert(qid.to_string(), terms.len() as u32);
        let mut term_freqs: HashMap<String, u32> = HashMap::new();
        for term in terms {
            *term_freqs.entry(term.clone()).or_insert(0) += 1;
        }
        for (term, freq) in term_freqs {
            self.postings
                .entry(term.clone())
                .or_default()
                .insert(qid.to_string(), freq);
            *self.doc_frequencies.entry(term).or_insert(0) += 1;
        }
    }

    fn remove_one(&mut self, qid: &str) {
        if self.doc_lengths.remove(qid).is_none() {
            return;
        }
        for (term, posting) in self.postings.iter_mut() {
            if posting.remove(qid).is_some() {
                if let Some(df) = self.doc_frequencies.get_mut(term) {
                    *df = df.saturating_sub(1);
                }
            }
        }
        self.postings.retain(|_, posting| !posting.is_empty());
        self.doc_frequencies.retain(|_, df| *df > 0);
    }

    fn update_avg_doc_length(&mut self) {
        let n = self.doc_lengths.len();
        if n == 0 {
            self.avg_doc_length = 0.0;
            return;
        }
        let total: u32 = self.doc_lengths.values().sum();
        self.avg_doc_length = total as f32 / n as f32;
    }

    fn invalidate_idf(&mut self) {
        self.precomputed_idf.borrow_mut().clear();
        *self.idf_computed_at_num_docs.borrow_mut() = usize::MAX;
    }

    fn ensure_idf_computed(&self) {
        let computed_at = *self.idf_computed_at_num_docs.borrow();
        if computed_at == self.doc_lengths.len() && !self.precomputed_idf.borrow().is_empty() {
            return;
        }
        let mut idf_map = self.precomputed_idf.borrow_mut();
        idf_map.clear();
        let n = self.doc_lengths.len() as f32;
        for (term, df) in &self.doc_frequencies {
            let df_f = *df as f32;
            if df_f > 0.0 {
                idf_map.insert(term.clone(), ((n - df_f + 0.5) / (df_f + 0.5) + 1.0).ln());
            }
        }
        *self.idf_computed_at_num_docs.borrow_mut() = self.doc_lengths.len();
    }

    fn idf(&self, term: &str) -> f32 {
        self.ensure_idf_computed();
        self.precomputed_idf.borrow().get(term).copied().unwrap_or(0.0)
    }

    fn score(&self, qid: &str, query_terms: &[String], params: Bm25Params) -> f32 {
        let avgdl = self.avg_doc_length.max(1.0);
        let dl = self.doc_lengths.get(qid).copied().unwrap_or(0).max(1) as f32;
        let mut score = 0.0;
        for term in query_terms {
            let idf = self.idf(term);
            if idf == 0.0 {
                continue;
            }
            let tf = self
                .postings
                .get(term)
                .and_then(|p| p.get(qid))
                .copied()
                .unwrap_or(0) as f32;
            if tf == 0.0 {
                continue;
            }
            let numerator = tf * (params.k1 + 1.0);
            let denominator = tf + params.k1 * (1.0 - params.b + params.b * dl / avgdl);
            score += idf * numerator / denominator;
        }
        score
    }

    /// Returns all qids with positive score, sorted by score descending,
    /// truncated to `top_k`. Empty query or empty index returns an error.
    pub fn search(&self, query_terms: &[String], top_k: usize) -> Result<Vec<(String, f32)>, RetrieveError> {
        self.search_with_params(query_terms, top_k, Bm25Params::default())
    }

    pub fn search_with_params(
        &self,
        query_terms: &[String],
        top_k: usize,
        params: Bm25Params,
    ) -> Result<Vec<(String, f32)>, RetrieveError> {
        if query_terms.is_empty() {
            return Err(RetrieveError::EmptyQuery);
        }
        if self.doc_lengths.is_empty() {
            return Err(RetrieveError::EmptyIndex);
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let distinct_terms: HashSet<&String> = query_terms.iter().collect();
        let mut candidates: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for term in &distinct_terms {
            if let Some(postings) = self.postings.get(term.as_str()) {
                for qid in postings.keys() {
                    if seen.insert(qid.as_str()) {
                        candidates.push(qid.as_str());
                    }
                }
            }
        }

        let mut heap: BinaryHeap<Reverse<(FloatOrd, String)>> = BinaryHeap::with_capacity(top_k + 1);
        for qid in candidates {
            let score = self.score(qid, query_terms, params);
            if !score.is_finite() || score <= 0.0 {
                continue;
            }
            if heap.len() < top_k {
                heap.push(Reverse((FloatOrd(score), qid.to_string())));
            } else if let Some(Reverse((FloatOrd(min_score), _))) = heap.peek() {
                if score > *min_score {
                    heap.pop();
                    heap.push(Reverse((FloatOrd(score), qid.to_string())));
                }
            }
        }

        let mut results: Vec<(String, f32)> = heap
            .into_iter()
            .map(|Reverse((FloatOrd(score), qid))| (qid, score))
            .collect();
        results.sort_unstable_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<BmRow> {
        vec![
            BmRow { qid: "q1".into(), terms: vec!["machine".into(), "learning".into(), "algorithms".into()] },
            BmRow { qid: "q2".into(), terms: vec!["information".into(), "retrieval".into()] },
            BmRow { qid: "q3".into(), terms: vec!["machine".into(), "learning".into(), "deep".into(), "learning".into()] },
        ]
    }

    #[test]
    fn empty_query_errs() {
        let mut idx = InvertedIndex::new();
        idx.add_documents(&rows());
        assert_eq!(idx.search(&[], 10), Err(RetrieveError::EmptyQuery));
    }

    #[test]
    fn empty_index_errs() {
        let idx = InvertedIndex::new();
        assert_eq!(idx.search(&["x".to_string()], 10), Err(RetrieveError::EmptyIndex));
    }

    #[test]
    fn ranks_more_relevant_doc_first() {
        let mut idx = InvertedIndex::new();
        idx.add_documents(&rows());
        let results = idx.search(&["machine".to_string(), "learning".to_string()], 10).unwrap();
        assert_eq!(results[0].0, "q3");
    }

    #[test]
    fn top_k_truncates() {
        let mut idx = InvertedIndex::new();
        idx.add_documents(&rows());
        let results = idx.search(&["machine".to_string(), "learning".to_string()], 1).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut idx = InvertedIndex::new();
        idx.add_documents(&rows());
        let a = idx.search(&["machine".to_string()], 10).unwrap();
        idx.add_documents(&rows());
        let b = idx.search(&["machine".to_string()], 10).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn removing_all_docs_yields_empty_index_error() {
        let mut idx = InvertedIndex::new();
        idx.add_documents(&rows());
        idx.remove_documents(&["q1".to_string(), "q2".to_string(), "q3".to_string()]);
        assert_eq!(idx.search(&["machine".to_string()], 10), Err(RetrieveError::EmptyIndex));
    }
}
