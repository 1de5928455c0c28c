//! @ai:module:intent Report generation for run results
//! @ai:module:layer infrastructure
//! @ai:module:public_api ReportGenerator, ReportFormat, JsonReporter, JsonlReporter, MarkdownReporter

pub mod console;
pub mod json_report;
pub mod jsonl_report;
pub mod markdown_report;

pub use console::{comparison_table, summary_table};
pub use json_report::{load_run_result, JsonReporter, JsonReporterTrait};
pub use jsonl_report::{JsonlReporter, JsonlReporterTrait};
pub use markdown_report::{MarkdownReporter, MarkdownReporterTrait};

use crate::metrics::RunResult;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// @ai:intent Output formats a run can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Jsonl,
    Markdown,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => "json",
            ReportFormat::Jsonl => "jsonl",
            ReportFormat::Markdown => "md",
        }
    }
}

impl std::str::FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "jsonl" => Ok(ReportFormat::Jsonl),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            other => anyhow::bail!("Unknown report format: {}", other),
        }
    }
}

/// @ai:intent Combined report generator
pub struct ReportGenerator {
    json: JsonReporter,
    jsonl: JsonlReporter,
    markdown: MarkdownReporter,
}

impl ReportGenerator {
    /// @ai:intent Create a new report generator
    /// @ai:effects pure
    pub fn new() -> Self {
        Self {
            json: JsonReporter::new(),
            jsonl: JsonlReporter::new(),
            markdown: MarkdownReporter::new(),
        }
    }

    /// @ai:intent Write one file per requested format, named after the run start time
    /// @ai:post unknown format names are skipped with a warning
    /// @ai:effects fs:write
    pub fn generate_all(
        &self,
        result: &RunResult,
        output_dir: &Path,
        formats: &[String],
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(output_dir)?;

        let base_name = format!("results_{}", result.started_at.format("%Y%m%d_%H%M%S"));
        let mut written = Vec::new();

        for name in formats {
            let format: ReportFormat = match name.parse() {
                Ok(format) => format,
                Err(err) => {
                    tracing::warn!("{}, skipping", err);
                    continue;
                }
            };

            let path = output_dir.join(format!("{}.{}", base_name, format.extension()));
            if written.contains(&path) {
                continue;
            }

            match format {
                ReportFormat::Json => self.json.generate(result, &path)?,
                ReportFormat::Jsonl => self.jsonl.generate(result, &path)?,
                ReportFormat::Markdown => self.markdown.generate(result, &path)?,
            }

            tracing::info!("Wrote {}", path.display());
            written.push(path);
        }

        Ok(written)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
