//! @ai:module:intent OpenAI-compatible chat completions adapter (also serves Ollama)
//! @ai:module:layer infrastructure
//! @ai:module:public_api OpenAiClient
//! @ai:module:stateless false

use crate::error::GatewayError;
use crate::gateway::client::{ChatMessage, Completion, ModelGateway, SamplingParams, Usage};
use crate::gateway::http::{build_client, check_status, join_url};
use crate::gateway::rate_limiter::RateLimiter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: Option<u32>,
}

/// @ai:intent Client for /chat/completions endpoints
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    provider: &'static str,
    rate_limiter: Arc<RateLimiter>,
}

impl OpenAiClient {
    /// @ai:intent Create a client for the OpenAI API
    /// @ai:effects pure
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            http: build_client()?,
            base_url: base_url.unwrap_or_else(|| OPENAI_BASE_URL.to_string()),
            api_key: Some(api_key),
            provider: "openai",
            rate_limiter,
        })
    }

    /// @ai:intent Create a keyless client for a local Ollama server
    /// @ai:effects pure
    pub fn ollama(base_url: Option<String>, rate_limiter: Arc<RateLimiter>) -> Result<Self, GatewayError> {
        Ok(Self {
            http: build_client()?,
            base_url: base_url.unwrap_or_else(|| OLLAMA_BASE_URL.to_string()),
            api_key: None,
            provider: "ollama",
            rate_limiter,
        })
    }
}

impl ModelGateway for OpenAiClient {
    /// @ai:effects network
    async fn generate(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> Result<Completion, GatewayError> {
        self.rate_limiter.acquire().await;

        let request = ApiRequest {
            model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let mut builder = self
            .http
            .post(join_url(&self.base_url, "chat/completions"))
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = check_status(self.provider, builder.send().await?).await?;
        let body: ApiResponse =
            response
                .json()
                .await
                .map_err(|e| GatewayError::InvalidResponse {
                    provider: self.provider,
                    message: e.to_string(),
                })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        let usage = body
            .usage
            .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens, u.total_tokens))
            .unwrap_or_default();

        Ok(Completion { content, usage })
    }
}
