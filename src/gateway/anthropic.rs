//! @ai:module:intent Anthropic messages API adapter
//! @ai:module:layer infrastructure
//! @ai:module:public_api AnthropicClient
//! @ai:module:stateless false

use crate::error::GatewayError;
use crate::gateway::client::{ChatMessage, Completion, ModelGateway, Role, SamplingParams, Usage};
use crate::gateway::http::{build_client, check_status, join_url};
use crate::gateway::rate_limiter::RateLimiter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// @ai:intent Claude API request body
#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<&'a ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// @ai:intent Claude API client with rate limiting
pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    rate_limiter: Arc<RateLimiter>,
}

impl AnthropicClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            http: build_client()?,
            base_url: base_url.unwrap_or_else(|| ANTHROPIC_BASE_URL.to_string()),
            api_key,
            rate_limiter,
        })
    }

    /// @ai:intent Lift system messages into the top-level system field
    /// @ai:effects pure
    fn split_system(messages: &[ChatMessage]) -> (Option<String>, Vec<&ChatMessage>) {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();

        let chat = messages.iter().filter(|m| m.role != Role::System).collect();

        let system = if system.is_empty() {
            None
        } else {
            Some(system.join("\n\n"))
        };

        (system, chat)
    }
}

impl ModelGateway for AnthropicClient {
    /// @ai:effects network
    async fn generate(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> Result<Completion, GatewayError> {
        self.rate_limiter.acquire().await;

        let (system, chat) = Self::split_system(messages);
        let request = ApiRequest {
            model,
            max_tokens: params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: params.temperature,
            system,
            messages: chat,
        };

        let response = self
            .http
            .post(join_url(&self.base_url, "v1/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let body: ApiResponse = check_status("anthropic", response)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse {
                provider: "anthropic",
                message: e.to_string(),
            })?;

        let content = body
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        let usage = body
            .usage
            .map(|u| Usage::new(u.input_tokens, u.output_tokens, None))
            .unwrap_or_default();

        Ok(Completion { content, usage })
    }
}
