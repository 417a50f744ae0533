//! The structured run record the proposer emits on stdout.
//!
//! One record per invocation, success or failure; every failure path is
//! normalized into this same shape. `fallback_used` is true exactly when
//! `ok` is false — no default trace is ever substituted while a backend ran.

use serde::{Deserialize, Serialize};

/// Generation metadata carried by every record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    /// Execution device/backend name (e.g., "mps", "cpu", "mock").
    pub device: String,
    /// Generation wall time in seconds. None when generation never ran.
    pub inference_s: Option<f64>,
    /// Number of tokens generated after the prompt.
    pub tokens_generated: usize,
}

impl RunMeta {
    /// Metadata for a request that never reached generation.
    pub fn before_generation(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            inference_s: None,
            tokens_generated: 0,
        }
    }
}

/// Result of one proposer invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Whether a grammar-legal trace was produced and validated.
    pub ok: bool,
    /// The original input text.
    pub query: String,
    /// The exact text given to the model. None if never constructed.
    pub prompt: Option<String>,
    /// Exactly what the model emitted after the prompt ("" on early failure).
    pub raw_text: String,
    /// The validated trace, one canonical line per entry. Empty on failure.
    pub ops: Vec<String>,
    /// True whenever `ok` is false.
    pub fallback_used: bool,
    pub meta: RunMeta,
    /// Human-readable failure description, present only when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    pub fn success(
        query: impl Into<String>,
        prompt: impl Into<String>,
        raw_text: impl Into<String>,
        ops: Vec<String>,
        meta: RunMeta,
    ) -> Self {
        Self {
            ok: true,
            query: query.into(),
            prompt: Some(prompt.into()),
            raw_text: raw_text.into(),
            ops,
            fallback_used: false,
            meta,
            error: None,
        }
    }

    pub fn failure(
        query: impl Into<String>,
        prompt: Option<String>,
        raw_text: impl Into<String>,
        error: impl Into<String>,
        meta: RunMeta,
    ) -> Self {
        Self {
            ok: false,
            query: query.into(),
            prompt,
            raw_text: raw_text.into(),
            ops: Vec::new(),
            fallback_used: true,
            meta,
            error: Some(error.into()),
        }
    }

    /// Process exit status conveying this record's outcome.
    pub fn exit_code(&self) -> i32 {
        if self.ok { 0 } else { 2 }
    }
}
