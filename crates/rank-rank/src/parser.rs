//! Minimal plain-text MCQ extraction.
//!
//! This is a bounded stand-in for a real document-ingestion pipeline (which
//! would involve PDF/OCR extraction, out of scope here): it exists only so
//! the `files` arm of `ingest` has a concrete collaborator to call.

use once_cell::sync::Lazy;
use regex::Regex;

/// A question parsed out of plain text, before it is turned into a
/// `QuestionDocument` by the engine.
#[derive(Debug, Clone)]
pub struct ParsedQuestion {
    pub stem: String,
    pub options: Vec<String>,
    pub answer: Option<String>,
    pub explanation: Option<String>,
    pub source_question_no: u32,
}

static BOUNDARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)(?:^|\n)\s*(?:question\s*\d+[).:]|\d+[).:])\s+").unwrap());
static ANSWER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\banswer\s*[:\-]\s*([A-D])\b").unwrap());
static EXPLANATION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)\bexplanation\s*[:\-]\s*(.*)$").unwrap());
static OPTION_STEM_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\n\s*[A-D][).:\-]\s+").unwrap());
static OPTION_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*[A-D][).:\-]\s*(.+)$").unwrap());

/// Splits raw text into question chunks on `Question N)`/`N.`-style
/// boundaries, then pulls stem, options, answer, and explanation out of each
/// chunk.
pub fn parse_questions_from_plain_text(content: &str) -> Vec<ParsedQuestion> {
    let text = content.replace('\r', "");
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let mut chunks: Vec<String> = BOUNDARY_RE
        .split(text)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if chunks.len() == 1 {
        chunks = vec![text.to_string()];
    }

    let mut out = Vec::new();
    for (idx, chunk) in chunks.iter().enumerate() {
        let answer = ANSWER_RE.captures(chunk).map(|c| c[1].to_uppercase());
        let explanation = EXPLANATION_RE.captures(chunk).map(|c| c[1].trim().to_string());
        let stem = OPTION_STEM_SPLIT_RE.splitn(chunk, 2).next().unwrap_or("").trim().to_string();
        let mut options = Vec::new();
        for line in chunk.lines() {
            if let Some(c) = OPTION_LINE_RE.captures(line.trim()) {
                options.push(c[1].trim().to_string());
            }
        }
        if !stem.is_empty() {
            out.push(ParsedQuestion {
                stem,
                options,
                answer,
                explanation,
                source_question_no: (idx + 1) as u32,
            });
        }
    }
    out
}

/// Parses the content field of a raw file row. Assumes nothing about how the
/// caller obtained that text (OCR, plain upload, etc.).
pub fn parse_questions_from_file(content: &str) -> Vec<ParsedQuestion> {
    parse_questions_from_plain_text(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_yields_no_questions() {
        assert!(parse_questions_from_plain_text("").is_empty());
        assert!(parse_questions_from_plain_text("   ").is_empty());
    }

    #[test]
    fn parses_single_numbered_question_with_options_and_answer() {
        let text = "1) What is 2 + 2?\nA) 3\nB) 4\nC) 5\nD) 6\nAnswer: B\nExplanation: basic addition.";
        let parsed = parse_questions_from_plain_text(text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].stem, "What is 2 + 2?");
        assert_eq!(parsed[0].options, vec!["3", "4", "5", "6"]);
        assert_eq!(parsed[0].answer.as_deref(), Some("B"));
        assert_eq!(parsed[0].explanation.as_deref(), Some("basic addition."));
    }

    #[test]
    fn parses_multiple_questions_from_one_document() {
        let text = "Question 1. First stem?\nA) x\nB) y\nAnswer: A\n\nQuestion 2. Second stem?\nA) p\nB) q\nAnswer: B";
        let parsed = parse_questions_from_plain_text(text);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].source_question_no, 1);
        assert_eq!(parsed[1].source_question_no, 2);
    }

    #[test]
    fn unmatched_text_falls_back_to_single_chunk() {
        let text = "just a stem with no markers at all";
        let parsed = parse_questions_from_plain_text(text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].stem, text);
    }
}
