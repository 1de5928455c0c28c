//! @ai:module:intent Capabilities: named benchmark modes that turn a test case into model messages
//! @ai:module:layer domain
//! @ai:module:public_api Capability, ChatCompletion, CapabilityKind, capability_by_name, normalize_name, list_capabilities
//! @ai:module:stateless true

use crate::dataset::TestCase;
use crate::error::{ConfigError, DataError};
use crate::gateway::ChatMessage;

/// @ai:intent Builds provider-ready messages for one benchmark mode
pub trait Capability: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// @ai:intent Reject test cases this capability cannot run
    fn validate(&self, case: &TestCase) -> Result<(), DataError>;

    /// @ai:intent Build the ordered message sequence for a gateway call
    /// @ai:pre validate(case) succeeded
    fn build_messages(&self, case: &TestCase, system_prompt: &str) -> Vec<ChatMessage>;
}

/// @ai:intent Multi-turn chat: every user turn sent at once, no assistant turns interleaved
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatCompletion;

impl Capability for ChatCompletion {
    fn name(&self) -> &'static str {
        "chat_completion"
    }

    fn description(&self) -> &'static str {
        "Multi-turn chat conversation benchmark"
    }

    fn validate(&self, case: &TestCase) -> Result<(), DataError> {
        case.validate()
    }

    /// @ai:effects pure
    fn build_messages(&self, case: &TestCase, system_prompt: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(case.turns.len() + 1);

        if !system_prompt.is_empty() {
            messages.push(ChatMessage::system(system_prompt));
        }

        messages.extend(case.turns.iter().map(ChatMessage::user));
        messages
    }
}

/// @ai:intent Registry entry; resolves to a concrete capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    ChatCompletion,
}

impl CapabilityKind {
    pub fn capability(&self) -> &'static dyn Capability {
        match self {
            CapabilityKind::ChatCompletion => &ChatCompletion,
        }
    }
}

const REGISTRY: &[(&str, CapabilityKind)] = &[
    ("chat_completion", CapabilityKind::ChatCompletion),
    ("chat", CapabilityKind::ChatCompletion),
];

/// @ai:intent Canonical spelling of a configured capability name, used as its statistics key
/// @ai:effects pure
pub fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

/// @ai:intent Look up a capability by (case-insensitive) name or alias
/// @ai:effects pure
pub fn capability_by_name(name: &str) -> Result<CapabilityKind, ConfigError> {
    let wanted = normalize_name(name);
    REGISTRY
        .iter()
        .find(|(key, _)| *key == wanted)
        .map(|(_, kind)| *kind)
        .ok_or_else(|| ConfigError::UnknownCapability {
            name: name.to_string(),
            available: REGISTRY
                .iter()
                .map(|(key, _)| *key)
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// @ai:intent (name, description) of every distinct capability
pub fn list_capabilities() -> Vec<(&'static str, &'static str)> {
    vec![(ChatCompletion.name(), ChatCompletion.description())]
}
