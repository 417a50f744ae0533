//! Deterministic query interpreter.
//!
//! Maps free-text queries onto one or more semantically-equivalent canonical
//! trace strings. Total (every query yields a non-empty candidate set, falling
//! back to fixed defaults) and deterministic (same text, same set, same
//! order). The heuristic rules live in explicit, ordered tables in `rules` —
//! determinism and extensibility are structural, not incidental.

pub mod entity;
pub mod interpret;
pub mod rules;

pub use interpret::{Interpretation, candidates, interpret};
