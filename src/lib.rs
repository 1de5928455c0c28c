//! @ai:module:intent Pairwise LLM benchmark library: two models, one judge, swap-mitigated verdicts
//! @ai:module:layer application
//! @ai:module:public_api capability, config, dataset, error, gateway, judge, metrics, report, runner

pub mod capability;
pub mod config;
pub mod dataset;
pub mod error;
pub mod gateway;
pub mod judge;
pub mod metrics;
pub mod report;
pub mod runner;

pub use config::BenchmarkConfig;
pub use dataset::{DatasetLoader, TestCase};
pub use error::{BenchError, ConfigError, DataError, GatewayError};
pub use gateway::{MockGateway, ModelGateway, ProviderGateway};
pub use judge::{JudgeProtocol, ReconciledVerdict, Verdict, Winner};
pub use metrics::{RunResult, RunSummary, StatsAccumulator};
pub use report::ReportGenerator;
pub use runner::Orchestrator;
