//! Strict post-decoding validation.
//!
//! Byte-for-byte membership against the candidate set. No normalization, no
//! trimming beyond what the grammar defines (the trailing newline is part of
//! the canonical form), no repair, no fallback substitution.

use tr_protocol::{CandidateSet, Trace};

use crate::error::{DecodeError, DecodeResult};

/// Accept the raw text iff it equals a candidate exactly, splitting it into
/// a trace on success. On mismatch the raw text is preserved verbatim for
/// diagnosis.
pub fn validate(raw_text: &str, candidates: &CandidateSet) -> DecodeResult<Trace> {
    if !candidates.contains(raw_text) {
        return Err(DecodeError::OffGrammar {
            raw_text: raw_text.to_string(),
        });
    }
    Trace::parse(raw_text).map_err(|e| DecodeError::Protocol(e.to_string()))
}
