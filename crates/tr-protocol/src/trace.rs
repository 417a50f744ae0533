//! Ordered operation sequences and their canonical text form.

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, ProtocolResult};
use crate::ops::Op;

/// An ordered sequence of operations. The canonical text form is the
/// newline-joined rendering of each operation with a trailing newline —
/// that trailing newline is part of the form, not decoration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub ops: Vec<Op>,
}

impl Trace {
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Render the canonical text form.
    pub fn canonical_text(&self) -> String {
        let mut out = String::new();
        for op in &self.ops {
            out.push_str(&op.to_string());
            out.push('\n');
        }
        out
    }

    /// Parse a canonical text form back into operations. Blank lines are
    /// skipped; any non-canonical line is an error.
    pub fn parse(text: &str) -> ProtocolResult<Self> {
        let ops: Vec<Op> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::parse)
            .collect::<Result<_, _>>()?;
        if ops.is_empty() {
            return Err(ProtocolError::EmptyTrace);
        }
        Ok(Self { ops })
    }
}

impl std::fmt::Display for Trace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.canonical_text())
    }
}
