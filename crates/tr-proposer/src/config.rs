//! Proposer configuration, loadable from TOML or environment.

use serde::Deserialize;
use tr_decoder::HttpBackendConfig;

/// Top-level configuration for the proposer binary.
#[derive(Debug, Clone, Deserialize)]
pub struct ProposerConfig {
    /// Token service connection settings.
    #[serde(default)]
    pub backend: HttpBackendConfig,
    /// Replay the validated trace against the certified universe after a
    /// successful run, logging the outcome. Never changes the run record.
    #[serde(default)]
    pub ground_check: bool,
}

impl Default for ProposerConfig {
    fn default() -> Self {
        Self {
            backend: HttpBackendConfig::default(),
            ground_check: false,
        }
    }
}

impl ProposerConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load from the `TRACERAIL_CONFIG` file when set, otherwise from
    /// `TRACERAIL_*` environment variables with defaults.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var("TRACERAIL_CONFIG") {
            Ok(path) => Self::from_file(&path),
            Err(_) => Ok(Self {
                backend: HttpBackendConfig::from_env(),
                ground_check: std::env::var("TRACERAIL_GROUND_CHECK")
                    .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                    .unwrap_or(false),
            }),
        }
    }
}
