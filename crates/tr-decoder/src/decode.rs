//! The decoding loop: drive the backend for at most `max_len` new tokens,
//! with the constrained step function as the sole source of legal
//! continuations. Fully deterministic — no sampling, no beam search.

use std::time::Instant;

use tr_protocol::CandidateSet;

use crate::backend::TokenBackend;
use crate::constrain::ConstrainedStep;
use crate::error::DecodeResult;
use crate::trie::TrieIndex;

/// What the loop produced, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    /// Detokenized text of everything generated after the prompt.
    pub raw_text: String,
    pub tokens_generated: usize,
    /// Generation wall time in seconds (excludes candidate tokenization).
    pub inference_s: f64,
}

/// Run one constrained generation over the candidate set.
///
/// Tokenizes the candidates, builds the per-request trie, primes the
/// backend with one discarded forward pass over the prompt, then steps
/// until the finish token or the trie's length budget.
pub async fn decode_constrained(
    backend: &dyn TokenBackend,
    prompt: &str,
    candidates: &CandidateSet,
) -> DecodeResult<Decoded> {
    let mut sequences = Vec::with_capacity(candidates.len());
    for text in candidates.texts() {
        sequences.push(backend.encode(text).await?);
    }
    let trie = TrieIndex::build(&sequences);
    let step = ConstrainedStep::new(&trie, backend.eos_token());

    let prompt_ids = backend.encode(prompt).await?;
    backend.prime(&prompt_ids).await?;

    let start = Instant::now();
    let mut context = prompt_ids;
    let prompt_len = context.len();
    let mut generated: Vec<u32> = Vec::with_capacity(trie.max_len());

    for _ in 0..trie.max_len() {
        let allowed = step.allowed(&generated);
        let token = backend.next_token(&context, &allowed).await?;
        if !allowed.contains(&token) {
            // Contract violation by the backend. Keep going — the strict
            // validator is the defense-in-depth check behind the mask.
            tracing::warn!(token, "backend chose a token outside the allowed set");
        }
        if step.is_finish(token) {
            break;
        }
        generated.push(token);
        context.push(token);
    }
    let inference_s = start.elapsed().as_secs_f64();

    let raw_text = backend.decode_text(&generated).await?;
    tracing::debug!(
        prompt_tokens = prompt_len,
        tokens_generated = generated.len(),
        inference_s,
        "constrained generation finished"
    );

    Ok(Decoded {
        raw_text,
        tokens_generated: generated.len(),
        inference_s,
    })
}
