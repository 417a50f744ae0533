//! Proposer library — wires the interpreter, the constrained decoder, and
//! the strict validator into one single-request pipeline, normalizing every
//! failure into the structured run record.

pub mod config;
pub mod pipeline;

pub use config::ProposerConfig;
pub use pipeline::{build_prompt, ground_check, run_query};
