//! Top-level engine errors.

use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    PersistenceIo(std::io::Error),
    MalformedJsonLine { line: usize, source: serde_json::Error },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::PersistenceIo(e) => write!(f, "persistence io error: {e}"),
            EngineError::MalformedJsonLine { line, source } => {
                write!(f, "malformed JSON on line {line}: {source}")
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::PersistenceIo(e) => Some(e),
            EngineError::MalformedJsonLine { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::PersistenceIo(e)
    }
}
