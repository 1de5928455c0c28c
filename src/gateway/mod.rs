//! @ai:module:intent Model gateway: uniform generate() over LLM providers
//! @ai:module:layer infrastructure
//! @ai:module:public_api ModelGateway, ProviderGateway, ChatMessage, Completion, MockGateway, ScriptedGateway, RateLimiter

pub mod anthropic;
pub mod client;
pub mod gemini;
mod http;
pub mod openai;
pub mod provider;
pub mod rate_limiter;

pub use anthropic::AnthropicClient;
pub use client::{
    ChatMessage, Completion, MockGateway, ModelGateway, Role, SamplingParams, ScriptedGateway,
    Usage,
};
pub use gemini::GeminiClient;
pub use openai::OpenAiClient;
pub use provider::{GatewaySpec, ProviderGateway};
pub use rate_limiter::RateLimiter;
