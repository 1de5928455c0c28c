//! @ai:module:intent Error taxonomy for configuration, data, gateway and run failures
//! @ai:module:layer domain
//! @ai:module:public_api ConfigError, DataError, GatewayError, BenchError, Stage
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// @ai:intent Fatal configuration problems, detected before any network activity
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("exactly 2 models are required for a pairwise run, got {0}")]
    ModelCount(usize),

    #[error("both models resolve to the same display name '{0}'; set distinct aliases")]
    DuplicateModel(String),

    #[error("unknown capability '{name}' (available: {available})")]
    UnknownCapability { name: String, available: String },

    #[error("capability '{0}' is listed more than once")]
    DuplicateCapability(String),

    #[error("no capabilities configured")]
    NoCapabilities,

    #[error("invalid model spec '{0}', expected provider/model")]
    InvalidModelSpec(String),

    #[error("unknown provider '{0}' (available: openai, anthropic, gemini, ollama)")]
    UnknownProvider(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// @ai:intent Malformed dataset input, rejected at load time
#[derive(Error, Debug)]
pub enum DataError {
    #[error("failed to read dataset {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: invalid test case: {source}")]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("test case has an empty id")]
    EmptyId,

    #[error("test case '{0}' has no turns")]
    NoTurns(String),

    #[error("duplicate test case id '{0}'")]
    DuplicateId(String),
}

/// @ai:intent Failures talking to a model provider
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("missing required environment variable: {0}")]
    MissingApiKey(String),

    #[error("authentication rejected by {provider} ({status})")]
    Auth { provider: &'static str, status: u16 },

    #[error("rate limited by {provider}, retry after {retry_after:?}")]
    RateLimited {
        provider: &'static str,
        retry_after: Duration,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: &'static str,
        status: u16,
        message: String,
    },

    #[error("invalid response from {provider}: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },
}

impl GatewayError {
    /// @ai:intent Whether retrying the same request may succeed
    /// @ai:effects pure
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::RateLimited { .. } | GatewayError::Network(_) => true,
            GatewayError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// @ai:intent Provider-requested delay before the next attempt, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            GatewayError::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

/// @ai:intent Pipeline stage at which a test case failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    ModelA,
    ModelB,
    Judge,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ModelA => "model_a",
            Stage::ModelB => "model_b",
            Stage::Judge => "judge",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent Top-level error for a benchmark run
#[derive(Error, Debug)]
pub enum BenchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error("case '{case_id}' ({capability}) failed at {stage} ({model}): {source}")]
    CaseFailed {
        case_id: String,
        capability: String,
        stage: Stage,
        model: String,
        #[source]
        source: GatewayError,
    },
}

pub type Result<T> = std::result::Result<T, BenchError>;
