//! @ai:module:intent JSON report generation and loading
//! @ai:module:layer infrastructure
//! @ai:module:public_api JsonReporter, load_run_result
//! @ai:module:stateless true

use crate::metrics::RunResult;
use anyhow::{Context, Result};
use std::path::Path;

/// @ai:intent Trait for JSON report generation
pub trait JsonReporterTrait: Send + Sync {
    /// @ai:intent Generate JSON report from a run result
    fn generate(&self, result: &RunResult, output_path: &Path) -> Result<()>;
}

/// @ai:intent Writes the whole RunResult as pretty-printed JSON
pub struct JsonReporter;

impl JsonReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonReporterTrait for JsonReporter {
    /// @ai:effects fs:write
    fn generate(&self, result: &RunResult, output_path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(result)?;
        std::fs::write(output_path, json)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        Ok(())
    }
}

/// @ai:intent Read back a RunResult saved by the JSON reporter
/// @ai:effects fs:read
pub fn load_run_result(path: &Path) -> Result<RunResult> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("{} is not a saved run result", path.display()))
}
