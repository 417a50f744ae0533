//! Trace grammar error types.

use thiserror::Error;

/// Errors that can occur while parsing or assembling trace material.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unknown operation: {0}")]
    UnknownOp(String),

    #[error("malformed operation line: {0}")]
    Malformed(String),

    #[error("trace has no operations")]
    EmptyTrace,

    #[error("candidate set must have at least one member")]
    EmptyCandidates,
}

/// Convenience alias for trace grammar results.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
