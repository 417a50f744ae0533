//! Token backend abstraction — the external model/tokenizer collaborator.

use async_trait::async_trait;

use crate::error::DecodeResult;

/// Health report from the execution backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendHealth {
    /// Device the backend would run on (e.g., "mps", "cpu").
    pub device: String,
    /// Whether the required hardware acceleration is usable. The proposer
    /// fails fast when this is false — no known-unstable fallback path.
    pub accelerated: bool,
}

/// Abstraction over the model + tokenizer pair.
///
/// Analogous to `LogSource` elsewhere in the workspace — enables mocking
/// for tests and swappable backends (HTTP sidecar, in-process, etc.).
/// The core assumes a ready tokenizer and a ready token-generation
/// function; it does not manage their lifecycle.
#[async_trait]
pub trait TokenBackend: Send + Sync {
    /// Backend name for records and logging.
    fn name(&self) -> &str;

    /// End-of-sequence token id, if the vocabulary defines one.
    fn eos_token(&self) -> Option<u32>;

    /// Probe device availability. Must be called before any other work.
    async fn health(&self) -> DecodeResult<BackendHealth>;

    /// Tokenize text into ids (no special tokens added).
    async fn encode(&self, text: &str) -> DecodeResult<Vec<u32>>;

    /// Detokenize ids back into text (special tokens skipped).
    async fn decode_text(&self, ids: &[u32]) -> DecodeResult<String>;

    /// Run one discarded forward pass over the prompt. Some execution
    /// backends need an allocation-priming pass before generation; others
    /// treat this as a no-op.
    async fn prime(&self, prompt_ids: &[u32]) -> DecodeResult<()>;

    /// Greedy-select the next token given the full context, restricted to
    /// the `allowed` set. The contract requires the returned token to be a
    /// member of `allowed`.
    async fn next_token(&self, context: &[u32], allowed: &[u32]) -> DecodeResult<u32>;
}
