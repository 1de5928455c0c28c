//! @ai:module:intent Result and statistics types for pairwise runs
//! @ai:module:layer domain
//! @ai:module:public_api ModelResponse, CaseResult, CaseFailure, CapabilityTally, CategoryTally, ModelSummary, CapabilitySummary, RunSummary, ConfigSummary, RunResult
//! @ai:module:stateless true

use crate::capability::normalize_name;
use crate::config::{BenchmarkConfig, ModelIdentity};
use crate::error::Stage;
use crate::judge::{ReconciledVerdict, Winner};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// @ai:intent One model's answer to one case, with its measured cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub model: String,
    pub response: String,
    pub latency_ms: f64,
    /// Total tokens as reported by the gateway, 0 when unknown
    pub tokens: u32,
    pub score: f64,
}

/// @ai:intent Judged outcome of one (test case, capability) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseResult {
    pub test_id: String,
    pub category: String,
    pub capability: String,
    pub turns: Vec<String>,
    pub model_a: ModelResponse,
    pub model_b: ModelResponse,
    pub verdict: ReconciledVerdict,
    pub timestamp: DateTime<Utc>,
}

impl CaseResult {
    pub fn winner(&self) -> Winner {
        self.verdict.winner
    }

    /// @ai:intent Display name of the winning model, or "tie"
    pub fn winner_name(&self) -> &str {
        match self.verdict.winner {
            Winner::A => &self.model_a.model,
            Winner::B => &self.model_b.model,
            Winner::Tie => "tie",
        }
    }
}

/// @ai:intent A test case excluded from statistics because a gateway call failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseFailure {
    pub case_id: String,
    pub capability: String,
    pub stage: Stage,
    pub model: String,
    pub error: String,
}

/// @ai:intent Counters for one model on one capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityTally {
    pub wins: u32,
    pub ties: u32,
    pub losses: u32,
    pub scores: Vec<f64>,
}

impl CapabilityTally {
    pub fn judged(&self) -> u32 {
        self.wins + self.ties + self.losses
    }
}

/// @ai:intent Coarse per-category counters for one model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub wins: u32,
    pub ties: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySummary {
    pub wins: u32,
    pub ties: u32,
    pub losses: u32,
    pub avg_score: f64,
}

/// @ai:intent Totals for one model across every capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub total_wins: u32,
    pub total_ties: u32,
    pub total_losses: u32,
    pub avg_score: f64,
    pub by_capability: BTreeMap<String, CapabilitySummary>,
}

/// @ai:intent End-of-run reduction of the accumulated statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_test_cases: usize,
    /// Display names in run order (model A first)
    pub model_order: Vec<String>,
    pub models: BTreeMap<String, ModelSummary>,
    pub by_category: BTreeMap<String, BTreeMap<String, CategoryTally>>,
    /// Display name of the model with strictly more wins, or "tie"
    pub overall_winner: String,
}

/// @ai:intent The slice of configuration recorded alongside results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub domain: String,
    pub capabilities: Vec<String>,
    pub models: Vec<ModelIdentity>,
    pub judge: ModelIdentity,
}

impl ConfigSummary {
    pub fn from_config(config: &BenchmarkConfig) -> Self {
        Self {
            domain: config.domain.name.clone(),
            capabilities: config
                .capabilities
                .iter()
                .map(|name| normalize_name(name))
                .collect(),
            models: config.models.iter().map(|m| m.identity()).collect(),
            judge: ModelIdentity {
                provider: config.judge.provider,
                model: config.judge.model.clone(),
                alias: None,
            },
        }
    }
}

/// @ai:intent Complete record of a run, the shape every report format renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub config: ConfigSummary,
    pub summary: RunSummary,
    #[serde(default)]
    pub results: Vec<CaseResult>,
    #[serde(default)]
    pub failures: Vec<CaseFailure>,
}
