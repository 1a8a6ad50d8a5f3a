//! Decision error types.

use thiserror::Error;

/// Errors surfaced by admission decisions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecisionError {
    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("invalid admission policy: {0}")]
    InvalidPolicy(String),
}

pub type DecisionResult<T> = Result<T, DecisionError>;
