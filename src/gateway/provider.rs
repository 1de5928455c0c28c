//! @ai:module:intent Provider registry: picks an adapter by ProviderKind and retries transient failures
//! @ai:module:layer infrastructure
//! @ai:module:public_api ProviderGateway, GatewaySpec
//! @ai:module:stateless false

use crate::config::{JudgeConfig, ModelConfig, ProviderKind};
use crate::error::GatewayError;
use crate::gateway::anthropic::AnthropicClient;
use crate::gateway::client::{ChatMessage, Completion, ModelGateway, SamplingParams};
use crate::gateway::gemini::GeminiClient;
use crate::gateway::http::api_key_from_env;
use crate::gateway::openai::OpenAiClient;
use crate::gateway::rate_limiter::RateLimiter;
use std::sync::Arc;
use std::time::Duration;

const BASE_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// @ai:intent Connection details for one provider endpoint
#[derive(Debug, Clone)]
pub struct GatewaySpec {
    pub provider: ProviderKind,
    pub api_key_env: Option<String>,
    pub base_url: Option<String>,
}

impl From<&ModelConfig> for GatewaySpec {
    fn from(model: &ModelConfig) -> Self {
        Self {
            provider: model.provider,
            api_key_env: model.api_key_env.clone(),
            base_url: model.base_url.clone(),
        }
    }
}

impl From<&JudgeConfig> for GatewaySpec {
    fn from(judge: &JudgeConfig) -> Self {
        Self {
            provider: judge.provider,
            api_key_env: judge.api_key_env.clone(),
            base_url: judge.base_url.clone(),
        }
    }
}

enum Adapter {
    OpenAi(OpenAiClient),
    Anthropic(AnthropicClient),
    Gemini(GeminiClient),
}

impl Adapter {
    async fn generate(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> Result<Completion, GatewayError> {
        match self {
            Adapter::OpenAi(client) => client.generate(model, messages, params).await,
            Adapter::Anthropic(client) => client.generate(model, messages, params).await,
            Adapter::Gemini(client) => client.generate(model, messages, params).await,
        }
    }
}

/// @ai:intent Gateway over any supported provider, with bounded retry on transient errors
pub struct ProviderGateway {
    kind: ProviderKind,
    adapter: Adapter,
    max_retries: u32,
}

impl ProviderGateway {
    /// @ai:intent Build the adapter for a provider, resolving its API key up front
    /// @ai:pre the provider's API key variable is set (except for ollama)
    /// @ai:effects env
    pub fn connect(
        spec: &GatewaySpec,
        requests_per_minute: u32,
        max_retries: u32,
    ) -> Result<Self, GatewayError> {
        let limiter = Arc::new(RateLimiter::per_minute(requests_per_minute));
        let api_key = match spec.provider.default_api_key_env() {
            Some(default_env) => {
                let var = spec.api_key_env.as_deref().unwrap_or(default_env);
                Some(api_key_from_env(var)?)
            }
            None => None,
        };
        let base_url = spec.base_url.clone();

        let adapter = match (spec.provider, api_key) {
            (ProviderKind::Ollama, _) => Adapter::OpenAi(OpenAiClient::ollama(base_url, limiter)?),
            (ProviderKind::OpenAi, Some(key)) => {
                Adapter::OpenAi(OpenAiClient::new(key, base_url, limiter)?)
            }
            (ProviderKind::Anthropic, Some(key)) => {
                Adapter::Anthropic(AnthropicClient::new(key, base_url, limiter)?)
            }
            (ProviderKind::Gemini, Some(key)) => {
                Adapter::Gemini(GeminiClient::new(key, base_url, limiter)?)
            }
            (kind, None) => {
                return Err(GatewayError::MissingApiKey(
                    kind.default_api_key_env().unwrap_or_default().to_string(),
                ))
            }
        };

        Ok(Self {
            kind: spec.provider,
            adapter,
            max_retries,
        })
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    /// @ai:intent Exponential backoff, overridden by a provider retry-after
    /// @ai:effects pure
    fn backoff(attempt: u32, err: &GatewayError) -> Duration {
        err.retry_after().unwrap_or_else(|| {
            BASE_BACKOFF
                .saturating_mul(2u32.saturating_pow(attempt))
                .min(MAX_BACKOFF)
        })
    }
}

impl ModelGateway for ProviderGateway {
    /// @ai:effects network, time
    async fn generate(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> Result<Completion, GatewayError> {
        let mut attempt = 0;
        loop {
            match self.adapter.generate(model, messages, params).await {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let wait = Self::backoff(attempt, &err);
                    tracing::warn!(
                        "{} call to {} failed ({}), retrying in {:?}",
                        self.kind,
                        model,
                        err,
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
