//! The set of admissible trace renderings for one query.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::trace::Trace;

/// Non-empty, deduplicated, lexicographically sorted set of canonical trace
/// strings. Every member is an acceptable output for the query it was built
/// from; the sort order is the reproducible tie-break used everywhere a
/// single member must be picked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSet {
    texts: Vec<String>,
}

impl CandidateSet {
    /// Build from an arbitrary list of renderings. Fails on an empty list —
    /// the interpreter never produces one, but library callers might.
    pub fn try_new(mut texts: Vec<String>) -> ProtocolResult<Self> {
        if texts.is_empty() {
            return Err(ProtocolError::EmptyCandidates);
        }
        texts.sort();
        texts.dedup();
        Ok(Self { texts })
    }

    /// Build from the two serializations the interpreter emits. Collapses to
    /// a single member when both render identically.
    pub fn from_pair(a: Trace, b: Trace) -> Self {
        let mut texts = vec![a.canonical_text(), b.canonical_text()];
        texts.sort();
        texts.dedup();
        Self { texts }
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Exact membership test — the validator's core check.
    pub fn contains(&self, text: &str) -> bool {
        self.texts.iter().any(|t| t == text)
    }
}
