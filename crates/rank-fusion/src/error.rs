//! Error types for rank-fusion.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum FusionError {
    /// A configured weight was negative.
    NegativeWeight { field: &'static str, value: f32 },
}

impl fmt::Display for FusionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FusionError::NegativeWeight { field, value } => {
                write!(f, "fusion weight `{field}` must not be negative, got {value}")
            }
        }
    }
}

impl std::error::Error for FusionError {}
