//! Mock token backend for testing — byte-level tokenizer, deterministic
//! greedy choice, plus misbehaving and unavailable variants for
//! failure-path tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{BackendHealth, TokenBackend};
use crate::constrain::SENTINEL_TOKEN;
use crate::error::{DecodeError, DecodeResult};

/// Mock EOS id, one above the byte-level vocabulary.
pub const MOCK_EOS_TOKEN: u32 = 256;

#[derive(Debug, Clone)]
enum Behavior {
    /// Pick the lowest allowed token — a deterministic stand-in for greedy
    /// argmax under a constraint mask.
    Faithful,
    /// Emit a fixed token script regardless of the allowed set, then EOS.
    /// Models a backend that violates the constraint contract, which the
    /// validator must catch.
    Hijack(Vec<u32>),
}

/// A mock model + tokenizer pair. Tokenization is byte-level (id = byte
/// value), so any candidate text round-trips exactly.
pub struct MockTokenBackend {
    device: String,
    accelerated: bool,
    eos: Option<u32>,
    behavior: Behavior,
    hijack_cursor: AtomicUsize,
    prime_calls: AtomicUsize,
}

impl MockTokenBackend {
    pub fn new() -> Self {
        Self {
            device: "mock".into(),
            accelerated: true,
            eos: Some(MOCK_EOS_TOKEN),
            behavior: Behavior::Faithful,
            hijack_cursor: AtomicUsize::new(0),
            prime_calls: AtomicUsize::new(0),
        }
    }

    /// A vocabulary with no EOS id — exercises the sentinel path.
    pub fn without_eos() -> Self {
        Self {
            eos: None,
            ..Self::new()
        }
    }

    /// A backend whose accelerator is unusable (health precondition fails).
    pub fn unavailable() -> Self {
        Self {
            device: "cpu".into(),
            accelerated: false,
            ..Self::new()
        }
    }

    /// A backend that ignores the allowed set and emits `tokens`, then EOS.
    pub fn hijacking(tokens: Vec<u32>) -> Self {
        Self {
            behavior: Behavior::Hijack(tokens),
            ..Self::new()
        }
    }

    /// Number of warm-up passes requested so far.
    pub fn prime_calls(&self) -> usize {
        self.prime_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockTokenBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenBackend for MockTokenBackend {
    fn name(&self) -> &str {
        &self.device
    }

    fn eos_token(&self) -> Option<u32> {
        self.eos
    }

    async fn health(&self) -> DecodeResult<BackendHealth> {
        Ok(BackendHealth {
            device: self.device.clone(),
            accelerated: self.accelerated,
        })
    }

    async fn encode(&self, text: &str) -> DecodeResult<Vec<u32>> {
        Ok(text.bytes().map(u32::from).collect())
    }

    async fn decode_text(&self, ids: &[u32]) -> DecodeResult<String> {
        let bytes: Vec<u8> = ids
            .iter()
            .filter(|&&id| id < 256)
            .map(|&id| id as u8)
            .collect();
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn prime(&self, _prompt_ids: &[u32]) -> DecodeResult<()> {
        self.prime_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn next_token(&self, _context: &[u32], allowed: &[u32]) -> DecodeResult<u32> {
        match &self.behavior {
            Behavior::Faithful => allowed
                .iter()
                .copied()
                .min()
                .ok_or_else(|| DecodeError::Protocol("empty allowed set".into())),
            Behavior::Hijack(script) => {
                let i = self.hijack_cursor.fetch_add(1, Ordering::SeqCst);
                Ok(script
                    .get(i)
                    .copied()
                    .unwrap_or_else(|| self.eos.unwrap_or(SENTINEL_TOKEN)))
            }
        }
    }
}
