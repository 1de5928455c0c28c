//! @ai:module:intent Line-delimited JSON report: one summary line, then one line per case result and per failed case
//! @ai:module:layer infrastructure
//! @ai:module:public_api JsonlReporter
//! @ai:module:stateless true

use crate::metrics::{CaseFailure, CaseResult, ConfigSummary, RunResult, RunSummary};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::Path;
use uuid::Uuid;

/// @ai:intent Trait for JSONL report generation
pub trait JsonlReporterTrait: Send + Sync {
    fn generate(&self, result: &RunResult, output_path: &Path) -> Result<()>;
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Line<'a> {
    Summary {
        run_id: Uuid,
        name: &'a str,
        started_at: DateTime<Utc>,
        duration_seconds: f64,
        config: &'a ConfigSummary,
        summary: &'a RunSummary,
    },
    Result(&'a CaseResult),
    Failure(&'a CaseFailure),
}

pub struct JsonlReporter;

impl JsonlReporter {
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Write the summary line, every case result, then every failed case
    /// @ai:effects io
    fn write_lines<W: Write>(result: &RunResult, out: &mut W) -> Result<()> {
        let summary = Line::Summary {
            run_id: result.run_id,
            name: &result.name,
            started_at: result.started_at,
            duration_seconds: result.duration_seconds,
            config: &result.config,
            summary: &result.summary,
        };
        serde_json::to_writer(&mut *out, &summary)?;
        writeln!(out)?;

        for case in &result.results {
            serde_json::to_writer(&mut *out, &Line::Result(case))?;
            writeln!(out)?;
        }

        for failure in &result.failures {
            serde_json::to_writer(&mut *out, &Line::Failure(failure))?;
            writeln!(out)?;
        }
        Ok(())
    }
}

impl Default for JsonlReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonlReporterTrait for JsonlReporter {
    /// @ai:effects fs:write
    fn generate(&self, result: &RunResult, output_path: &Path) -> Result<()> {
        let file = std::fs::File::create(output_path)
            .with_context(|| format!("Failed to create {}", output_path.display()))?;
        let mut writer = BufWriter::new(file);
        Self::write_lines(result, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
