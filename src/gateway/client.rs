//! @ai:module:intent Uniform model gateway capability and in-memory gateways
//! @ai:module:layer infrastructure
//! @ai:module:public_api ModelGateway, ChatMessage, Role, SamplingParams, Usage, Completion, MockGateway, ScriptedGateway
//! @ai:module:stateless false

use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// @ai:intent Speaker of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// @ai:intent One message in an ordered conversation sent to a gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// @ai:intent Sampling parameters for one generate call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            max_tokens: None,
        }
    }
}

/// @ai:intent Token usage reported by a provider; zero when unknown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    /// @ai:intent Build usage, deriving the total when the provider omits it
    /// @ai:effects pure
    pub fn new(prompt_tokens: u32, completion_tokens: u32, total_tokens: Option<u32>) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: total_tokens.unwrap_or(prompt_tokens + completion_tokens),
        }
    }
}

/// @ai:intent Text produced by a gateway call plus its usage
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: Usage,
}

/// @ai:intent Uniform capability for sending a conversation to a model
#[allow(async_fn_in_trait)]
pub trait ModelGateway: Send + Sync {
    /// @ai:intent Generate a reply for the ordered messages
    /// @ai:effects network
    async fn generate(
        &self,
        model: &str,
        messages: &[ChatMessage],
        params: &SamplingParams,
    ) -> Result<Completion, GatewayError>;
}

/// @ai:intent Gateway that returns a fixed reply (dry runs)
pub struct MockGateway {
    response: String,
}

impl MockGateway {
    /// @ai:intent Create a mock gateway that returns a fixed response
    /// @ai:effects pure
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

impl ModelGateway for MockGateway {
    /// @ai:effects pure
    async fn generate(
        &self,
        _model: &str,
        _messages: &[ChatMessage],
        _params: &SamplingParams,
    ) -> Result<Completion, GatewayError> {
        Ok(Completion {
            content: self.response.clone(),
            usage: Usage::new(100, 200, None),
        })
    }
}

/// @ai:intent Gateway whose replies are computed by a closure over (model, messages)
pub struct ScriptedGateway<F> {
    responder: F,
    calls: AtomicUsize,
}

impl<F> ScriptedGateway<F>
where
    F: Fn(&str, &[ChatMessage]) -> Result<String, GatewayError> + Send + Sync,
{
    pub fn new(responder: F) -> Self {
        Self {
            responder,
            calls: AtomicUsize::new(0),
        }
    }

    /// @ai:intent Number of generate calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<F> ModelGateway for ScriptedGateway<F>
where
    F: Fn(&str, &[ChatMessage]) -> Result<String, GatewayError> + Send + Sync,
{
    async fn generate(
        &self,
        model: &str,
        messages: &[ChatMessage],
        _params: &SamplingParams,
    ) -> Result<Completion, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = (self.responder)(model, messages)?;
        let prompt_tokens = messages.iter().map(|m| m.content.len() as u32).sum();
        Ok(Completion {
            usage: Usage::new(prompt_tokens, content.len() as u32, None),
            content,
        })
    }
}
