//! Flat JSONL persistence for the question bank.
//!
//! One document per line, UTF-8. This is intentionally as simple as the
//! reference implementation's `local_store.py`: the engine does not provide
//! crash-safe or transactional storage (see `SPEC_FULL.md` §1 Non-goals), so
//! there is no WAL, no segment format, no checksums — just a flat file that
//! is rewritten wholesale on save and replayed through `ingest` on load.

use crate::error::EngineError;
use crate::types::QuestionDocument;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Writes one JSON document per line, creating parent directories as needed.
/// Returns the number of documents written.
pub fn save_questions_jsonl(path: impl AsRef<Path>, questions: impl Iterator<Item = QuestionDocument>) -> Result<usize, EngineError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = fs::File::create(path)?;
    let mut count = 0;
    for q in questions {
        let line = serde_json::to_string(&q).expect("QuestionDocument serialization cannot fail");
        writeln!(file, "{line}")?;
        count += 1;
    }
    Ok(count)
}

/// Parses each non-blank line as a `QuestionDocument`. Returns an empty list
/// if the file does not exist. A malformed line surfaces its 1-based line
/// number.
pub fn load_questions_jsonl(path: impl AsRef<Path>) -> Result<Vec<QuestionDocument>, EngineError> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)?;
    let mut rows = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let doc: QuestionDocument = serde_json::from_str(line)
            .map_err(|source| EngineError::MalformedJsonLine { line: idx + 1, source })?;
        rows.push(doc);
    }
    Ok(rows)
}
