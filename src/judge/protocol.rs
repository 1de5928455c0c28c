//! @ai:module:intent Swap-mitigated pairwise judging with bounded repair retries
//! @ai:module:layer application
//! @ai:module:public_api JudgeProtocol
//! @ai:module:stateless true

use crate::config::JudgeConfig;
use crate::dataset::case::format_transcript;
use crate::error::GatewayError;
use crate::gateway::{ChatMessage, ModelGateway, SamplingParams};
use crate::judge::parse::{normalize, parse_reply};
use crate::judge::prompt::{render_judge_prompt, CORRECTIVE_INSTRUCTION};
use crate::judge::verdict::{reconcile, ReconciledVerdict, Verdict};
use std::sync::Arc;

/// Characters of the last bad reply quoted in the fallback reason
const FALLBACK_EXCERPT_CHARS: usize = 200;

/// @ai:intent Asks a judge model to compare two responses in both orders and reconciles the results
pub struct JudgeProtocol<G: ModelGateway> {
    gateway: Arc<G>,
    model: String,
    params: SamplingParams,
    max_retries: u32,
}

impl<G: ModelGateway> JudgeProtocol<G> {
    pub fn new(gateway: Arc<G>, model: impl Into<String>, max_retries: u32) -> Self {
        Self {
            gateway,
            model: model.into(),
            params: SamplingParams::default(),
            max_retries,
        }
    }

    /// @ai:intent Build from judge configuration (temperature, retry budget)
    pub fn from_config(gateway: Arc<G>, config: &JudgeConfig) -> Self {
        Self {
            gateway,
            model: config.model.clone(),
            params: SamplingParams {
                temperature: config.temperature,
                max_tokens: None,
            },
            max_retries: config.max_retries,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// @ai:intent Judge (A, B) and (B, A) concurrently and reconcile into original labels
    /// @ai:pre conversation is non-empty
    /// @ai:post always a well-formed verdict unless the judge gateway itself fails
    /// @ai:effects network
    pub async fn evaluate_pair(
        &self,
        conversation: &[String],
        response_a: &str,
        response_b: &str,
        role: &str,
    ) -> Result<ReconciledVerdict, GatewayError> {
        let transcript = format_transcript(conversation);

        let (direct, swapped) = tokio::join!(
            self.judge_once(&transcript, response_a, response_b, role),
            self.judge_once(&transcript, response_b, response_a, role),
        );

        Ok(reconcile(&direct?, &swapped?))
    }

    /// @ai:intent One comparison in the given order, re-prompting on unparseable output
    /// @ai:post at most max_retries + 1 judge calls
    /// @ai:effects network
    async fn judge_once(
        &self,
        transcript: &str,
        first: &str,
        second: &str,
        role: &str,
    ) -> Result<Verdict, GatewayError> {
        let prompt = render_judge_prompt(role, transcript, first, second);
        let mut messages = vec![ChatMessage::user(prompt)];
        let mut attempt = 0;

        loop {
            let reply = self
                .gateway
                .generate(&self.model, &messages, &self.params)
                .await?
                .content;

            if let Some(payload) = parse_reply(&reply) {
                return Ok(normalize(&payload));
            }

            if attempt >= self.max_retries {
                tracing::warn!(
                    "Judge {} gave no parseable verdict after {} attempts",
                    self.model,
                    attempt + 1
                );
                let excerpt: String = reply.chars().take(FALLBACK_EXCERPT_CHARS).collect();
                return Ok(Verdict::fallback_tie(format!(
                    "Judge output not parseable as JSON. Last: {}",
                    excerpt
                )));
            }

            tracing::debug!("Judge reply not parseable (attempt {}), re-prompting", attempt + 1);
            messages.push(ChatMessage::assistant(reply));
            messages.push(ChatMessage::user(CORRECTIVE_INSTRUCTION));
            attempt += 1;
        }
    }
}
