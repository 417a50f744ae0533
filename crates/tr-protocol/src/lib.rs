//! Shared types for TraceRail.
//!
//! Defines the trace grammar (operations, canonical text form, per-domain
//! bit legends), the `CandidateSet` of admissible trace renderings, and the
//! `RunRecord` output contract emitted by the proposer binary.

pub mod candidates;
pub mod domain;
pub mod error;
pub mod legend;
pub mod ops;
pub mod record;
pub mod trace;

// Re-export key types for convenience
pub use candidates::CandidateSet;
pub use domain::Domain;
pub use error::{ProtocolError, ProtocolResult};
pub use legend::{BitPredicate, legend};
pub use ops::{Metric, Op};
pub use record::{RunMeta, RunRecord};
pub use trace::Trace;
