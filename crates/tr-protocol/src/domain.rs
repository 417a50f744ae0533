//! Trace domains supported in this version.

use serde::{Deserialize, Serialize};

/// A trace language domain. Each domain carries its own operation skeleton
/// and its own 7-bit predicate legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Reduced fractions num/den over a bounded universe.
    Fractional,
    /// Integer-sided triangles a,b,c with a ≤ b ≤ c.
    Geometric,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fractional => "fractional",
            Self::Geometric => "geometric",
        }
    }

    /// Fixed entity used when the query names none. Guarantees interpreter
    /// totality: the structural skeleton is always well-formed.
    pub fn default_entity(&self) -> &'static str {
        match self {
            Self::Fractional => "7/200",
            Self::Geometric => "5,12,13",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
