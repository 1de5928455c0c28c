//! @ai:module:intent Google Gemini generateContent adapter
//! @ai:module:layer infrastructure
//! @ai:module:public_api GeminiClient
//! @ai:module:stateless false

use crate::error::GatewayError;
use crate::gateway::client::{ChatMessage, Completion, ModelGateway, SamplingParams, Usage};
use crate::gateway::http::{build_client, check_status, join_url};
use crate::gateway::rate_limiter::RateLimiter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: Option<u32>,
}

/// @ai:intent Gemini client; conversations are flattened into one transcript prompt
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    rate_limiter: Arc<RateLimiter>,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            http: build_client()?,
            base_url: base_url.unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
            api_key,
            rate_limiter,
        })
    }

    /// @ai:intent Render messages as "ROLE: content" lines
    /// @ai:effects pure
    fn transcript(messages: &[ChatMessage]) -> String {
        messages
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str().to_uppercase(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl ModelGateway for GeminiClient {
    /// @ai:effects network
    async fn generate(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> Result<Completion, GatewayError> {
        self.rate_limiter.acquire().await;

        let request = ApiRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(Self::transcript(messages)),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
            },
        };

        let url = join_url(&self.base_url, &format!("models/{}:generateContent", model));
        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let body: ApiResponse = check_status("gemini", response)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse {
                provider: "gemini",
                message: e.to_string(),
            })?;

        let content = body
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        let usage = body
            .usage_metadata
            .map(|u| {
                Usage::new(
                    u.prompt_token_count,
                    u.candidates_token_count,
                    u.total_token_count,
                )
            })
            .unwrap_or_default();

        Ok(Completion { content, usage })
    }
}
