//! Trace execution error types.

use thiserror::Error;

/// Errors that can occur while replaying a trace.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("invalid element: {0}")]
    BadElement(String),

    #[error("trace has no leading structural operation")]
    MissingStart,

    #[error("bit index {0} outside the 7-bit legend")]
    BadBit(u8),

    #[error("bit value {0} is not 0 or 1")]
    BadBitValue(u8),

    #[error("constraint produced an empty set at step {step}")]
    EmptySet { step: usize },

    #[error("witness requested on an empty set at step {step}")]
    EmptyWitness { step: usize },

    #[error("operation {op} is not valid for the {domain} domain")]
    DomainMismatch {
        op: &'static str,
        domain: &'static str,
    },
}

/// Convenience alias for execution results.
pub type ExecResult<T> = Result<T, ExecError>;
