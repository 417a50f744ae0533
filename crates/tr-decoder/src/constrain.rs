//! The constrained step function.
//!
//! Pure and re-entrant: each call walks the trie from the root over the
//! tokens generated since the prompt boundary, with no memory of previous
//! calls. Applied at every step, it makes it structurally impossible for
//! the decoding loop to leave the candidate set's token-level prefix
//! closure.

use crate::trie::{TrieIndex, Walk};

/// Token forced when the vocabulary defines no end-of-sequence id.
pub const SENTINEL_TOKEN: u32 = 0;

/// Legal-continuation oracle for one request.
#[derive(Debug)]
pub struct ConstrainedStep<'a> {
    trie: &'a TrieIndex,
    eos: Option<u32>,
}

impl<'a> ConstrainedStep<'a> {
    pub fn new(trie: &'a TrieIndex, eos: Option<u32>) -> Self {
        Self { trie, eos }
    }

    /// The token that terminates generation: the vocabulary's EOS id, or
    /// the sentinel when none exists.
    pub fn finish_token(&self) -> u32 {
        self.eos.unwrap_or(SENTINEL_TOKEN)
    }

    pub fn is_finish(&self, token: u32) -> bool {
        token == self.finish_token()
    }

    /// Legal next tokens after the given generated suffix.
    ///
    /// Off-grammar walks force the finish token immediately — a derailed
    /// generation is stopped as early as possible rather than run to the
    /// length budget. Terminal walks force it too; otherwise exactly the
    /// trie node's children are offered.
    pub fn allowed(&self, generated: &[u32]) -> Vec<u32> {
        match self.trie.walk(generated) {
            Walk::Continue(ids) => ids,
            Walk::Terminal | Walk::OffGrammar => vec![self.finish_token()],
        }
    }
}
