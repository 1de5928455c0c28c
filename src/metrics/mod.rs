//! @ai:module:intent Statistics accumulation and run result types
//! @ai:module:layer application
//! @ai:module:public_api StatsAccumulator, RunSummary, RunResult, CaseResult, CaseFailure

pub mod aggregator;
pub mod types;

pub use aggregator::{summarize, StatsAccumulator};
pub use types::{
    CapabilitySummary, CapabilityTally, CaseFailure, CaseResult, CategoryTally, ConfigSummary,
    ModelResponse, ModelSummary, RunResult, RunSummary,
};
