//! HTTP token backend — client for the local token-service sidecar.
//!
//! The sidecar owns model weights, the tokenizer, and the accelerator; this
//! client only drives it. Token arrays may arrive flat or as a batch of one
//! (`[[...]]`) depending on the serving stack; both shapes are normalized to
//! a flat sequence at this boundary so the core decode loop never sees the
//! distinction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backend::{BackendHealth, TokenBackend};
use crate::error::{DecodeError, DecodeResult};

/// GPT-2 end-of-text id, the default vocabulary this service fronts.
const DEFAULT_EOS_TOKEN: u32 = 50256;

/// Configuration for the token-service client.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpBackendConfig {
    /// Token service base URL.
    #[serde(default = "default_host")]
    pub host: String,
    /// Model name the service should run.
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// End-of-sequence token id. None for vocabularies without one.
    #[serde(default = "default_eos_token")]
    pub eos_token: Option<u32>,
}

fn default_host() -> String {
    "http://127.0.0.1:8391".into()
}
fn default_model() -> String {
    "gpt2".into()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_eos_token() -> Option<u32> {
    Some(DEFAULT_EOS_TOKEN)
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            eos_token: default_eos_token(),
        }
    }
}

impl HttpBackendConfig {
    /// Load configuration from environment variables, using defaults for
    /// anything unset.
    pub fn from_env() -> Self {
        let host = std::env::var("TRACERAIL_BACKEND_HOST").unwrap_or_else(|_| default_host());
        let model = std::env::var("TRACERAIL_BACKEND_MODEL").unwrap_or_else(|_| default_model());
        let timeout_secs = std::env::var("TRACERAIL_BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(default_timeout_secs);
        let eos_token = match std::env::var("TRACERAIL_BACKEND_EOS_TOKEN") {
            Ok(s) if s.eq_ignore_ascii_case("none") => None,
            Ok(s) => s.parse().ok().or_else(default_eos_token),
            Err(_) => default_eos_token(),
        };
        Self {
            host,
            model,
            timeout_secs,
            eos_token,
        }
    }
}

// ── Wire types ────────────────────────────────────────────────

/// Token arrays as the service may send them: flat, or batch-of-one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenRows {
    Flat(Vec<u32>),
    Batch(Vec<Vec<u32>>),
}

impl TokenRows {
    /// Normalize to a flat ordered sequence.
    fn into_flat(self) -> Vec<u32> {
        match self {
            Self::Flat(ids) => ids,
            Self::Batch(rows) => rows.into_iter().next().unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct EncodeRequest<'a> {
    model: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct EncodeResponse {
    ids: TokenRows,
}

#[derive(Serialize)]
struct DecodeRequest<'a> {
    model: &'a str,
    ids: &'a [u32],
}

#[derive(Deserialize)]
struct DecodeResponse {
    text: String,
}

#[derive(Serialize)]
struct PrimeRequest<'a> {
    model: &'a str,
    ids: &'a [u32],
}

#[derive(Serialize)]
struct StepRequest<'a> {
    model: &'a str,
    ids: &'a [u32],
    allowed: &'a [u32],
}

#[derive(Deserialize)]
struct StepResponse {
    token: u32,
}

#[derive(Deserialize)]
struct HealthResponse {
    device: String,
    accelerated: bool,
}

// ── Client ────────────────────────────────────────────────────

/// Client for the token-service sidecar.
pub struct HttpBackend {
    client: reqwest::Client,
    config: HttpBackendConfig,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> DecodeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DecodeError::Transport(format!("failed to build http client: {e}")))?;
        Ok(Self { client, config })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/api/{endpoint}", self.config.host)
    }

    async fn post_json<T: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        body: &T,
    ) -> DecodeResult<R> {
        let response = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| DecodeError::Transport(format!("{endpoint}: {e}")))?;
        if !response.status().is_success() {
            return Err(DecodeError::Transport(format!(
                "{endpoint}: service returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| DecodeError::Protocol(format!("{endpoint}: {e}")))
    }
}

#[async_trait]
impl TokenBackend for HttpBackend {
    fn name(&self) -> &str {
        &self.config.model
    }

    fn eos_token(&self) -> Option<u32> {
        self.config.eos_token
    }

    async fn health(&self) -> DecodeResult<BackendHealth> {
        let response = self
            .client
            .get(self.url("health"))
            .send()
            .await
            .map_err(|e| DecodeError::Transport(format!("health: {e}")))?;
        if !response.status().is_success() {
            return Err(DecodeError::Transport(format!(
                "health: service returned {}",
                response.status()
            )));
        }
        let health: HealthResponse = response
            .json()
            .await
            .map_err(|e| DecodeError::Protocol(format!("health: {e}")))?;
        Ok(BackendHealth {
            device: health.device,
            accelerated: health.accelerated,
        })
    }

    async fn encode(&self, text: &str) -> DecodeResult<Vec<u32>> {
        let resp: EncodeResponse = self
            .post_json(
                "encode",
                &EncodeRequest {
                    model: &self.config.model,
                    text,
                },
            )
            .await?;
        Ok(resp.ids.into_flat())
    }

    async fn decode_text(&self, ids: &[u32]) -> DecodeResult<String> {
        let resp: DecodeResponse = self
            .post_json(
                "decode",
                &DecodeRequest {
                    model: &self.config.model,
                    ids,
                },
            )
            .await?;
        Ok(resp.text)
    }

    async fn prime(&self, prompt_ids: &[u32]) -> DecodeResult<()> {
        // Warm-up forward pass; the response body is deliberately discarded.
        let response = self
            .client
            .post(self.url("prime"))
            .json(&PrimeRequest {
                model: &self.config.model,
                ids: prompt_ids,
            })
            .send()
            .await
            .map_err(|e| DecodeError::Transport(format!("prime: {e}")))?;
        if !response.status().is_success() {
            return Err(DecodeError::Transport(format!(
                "prime: service returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    async fn next_token(&self, context: &[u32], allowed: &[u32]) -> DecodeResult<u32> {
        let resp: StepResponse = self
            .post_json(
                "step",
                &StepRequest {
                    model: &self.config.model,
                    ids: context,
                    allowed,
                },
            )
            .await?;
        Ok(resp.token)
    }
}
