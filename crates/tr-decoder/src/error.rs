//! Constrained-decoding error types.

use thiserror::Error;

/// Errors that can occur while driving a constrained generation.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The required hardware acceleration backend is not usable. Detected
    /// before any generation attempt; terminal and non-retryable.
    #[error("execution backend unavailable on device '{device}'")]
    BackendUnavailable { device: String },

    /// Transport-level failure talking to the token service.
    #[error("backend transport error: {0}")]
    Transport(String),

    /// The token service answered with something we could not interpret.
    #[error("backend protocol error: {0}")]
    Protocol(String),

    /// The validator's strict membership check failed. Carries the raw
    /// text verbatim for diagnosis; no repair is attempted.
    #[error("generated output not in trace grammar language")]
    OffGrammar { raw_text: String },
}

/// Convenience alias for decoding results.
pub type DecodeResult<T> = Result<T, DecodeError>;
