//! @ai:module:intent Markdown report generation
//! @ai:module:layer infrastructure
//! @ai:module:public_api MarkdownReporter
//! @ai:module:stateless true

use crate::metrics::{RunResult, RunSummary};
use anyhow::{Context, Result};
use std::fmt::Write as FmtWrite;
use std::path::Path;

/// @ai:intent Trait for Markdown report generation
pub trait MarkdownReporterTrait: Send + Sync {
    /// @ai:intent Generate Markdown report from a run result
    fn generate(&self, result: &RunResult, output_path: &Path) -> Result<()>;
}

/// @ai:intent Generates Markdown reports from run results
pub struct MarkdownReporter;

impl MarkdownReporter {
    /// @ai:intent Create a new Markdown reporter
    /// @ai:effects pure
    pub fn new() -> Self {
        Self
    }

    /// @ai:intent Header, configuration and model list
    /// @ai:effects pure
    fn generate_header(result: &RunResult, output: &mut String) -> std::fmt::Result {
        writeln!(output, "# Benchmark Report: {}", result.name)?;
        writeln!(output)?;
        writeln!(output, "**Date:** {}", result.started_at.to_rfc3339())?;
        writeln!(output, "**Run ID:** `{}`", result.run_id)?;
        writeln!(output, "**Duration:** {:.1} seconds", result.duration_seconds)?;
        writeln!(output)?;

        writeln!(output, "## Configuration")?;
        writeln!(output)?;
        writeln!(output, "- **Domain:** {}", result.config.domain)?;
        writeln!(
            output,
            "- **Capabilities:** {}",
            result.config.capabilities.join(", ")
        )?;
        writeln!(output, "- **Judge Model:** {}", result.config.judge.display_name())?;
        writeln!(output)?;

        writeln!(output, "### Models")?;
        writeln!(output)?;
        for model in &result.config.models {
            writeln!(
                output,
                "- **{}**: {}/{}",
                model.display_name(),
                model.provider,
                model.model
            )?;
        }
        writeln!(output)?;
        Ok(())
    }

    /// @ai:intent Totals table plus the overall winner line
    /// @ai:effects pure
    fn generate_summary(summary: &RunSummary, output: &mut String) -> std::fmt::Result {
        writeln!(output, "## Results Summary")?;
        writeln!(output)?;
        writeln!(output, "| Model | Wins | Ties | Losses | Avg Score |")?;
        writeln!(output, "|-------|------|------|--------|-----------|")?;

        for name in &summary.model_order {
            if let Some(stats) = summary.models.get(name) {
                writeln!(
                    output,
                    "| {} | {} | {} | {} | {:.2} |",
                    name, stats.total_wins, stats.total_ties, stats.total_losses, stats.avg_score
                )?;
            }
        }
        writeln!(output)?;

        if summary.overall_winner == "tie" {
            writeln!(output, "**Overall Winner:** Tie")?;
        } else {
            writeln!(output, "**Overall Winner:** {}", summary.overall_winner)?;
        }
        writeln!(output)?;
        Ok(())
    }

    /// @ai:intent Per-capability breakdown, one row per (capability, model)
    /// @ai:effects pure
    fn generate_capability_table(summary: &RunSummary, output: &mut String) -> std::fmt::Result {
        writeln!(output, "## Results by Capability")?;
        writeln!(output)?;
        writeln!(output, "| Capability | Model | Wins | Ties | Losses | Avg Score |")?;
        writeln!(output, "|------------|-------|------|------|--------|-----------|")?;

        for name in &summary.model_order {
            let Some(stats) = summary.models.get(name) else {
                continue;
            };
            for (capability, cap) in &stats.by_capability {
                writeln!(
                    output,
                    "| {} | {} | {} | {} | {} | {:.2} |",
                    capability, name, cap.wins, cap.ties, cap.losses, cap.avg_score
                )?;
            }
        }
        writeln!(output)?;
        Ok(())
    }

    /// @ai:intent Wins and ties per category, one column per model
    /// @ai:effects pure
    fn generate_category_table(summary: &RunSummary, output: &mut String) -> std::fmt::Result {
        if summary.by_category.is_empty() {
            return Ok(());
        }

        writeln!(output, "## Results by Category")?;
        writeln!(output)?;
        writeln!(output, "| Category | {} |", summary.model_order.join(" | "))?;
        writeln!(
            output,
            "|----------|{}|",
            vec!["---"; summary.model_order.len()].join("|")
        )?;

        for (category, tallies) in &summary.by_category {
            write!(output, "| {} |", category)?;
            for name in &summary.model_order {
                let tally = tallies.get(name).copied().unwrap_or_default();
                write!(output, " W:{} T:{} |", tally.wins, tally.ties)?;
            }
            writeln!(output)?;
        }
        writeln!(output)?;
        Ok(())
    }

    /// @ai:intent List cases excluded because a call failed
    /// @ai:effects pure
    fn generate_failures(result: &RunResult, output: &mut String) -> std::fmt::Result {
        if result.failures.is_empty() {
            return Ok(());
        }

        writeln!(output, "## Failed Cases")?;
        writeln!(output)?;
        writeln!(output, "| Case | Capability | Stage | Model | Error |")?;
        writeln!(output, "|------|------------|-------|-------|-------|")?;
        for failure in &result.failures {
            writeln!(
                output,
                "| {} | {} | {} | {} | {} |",
                failure.case_id,
                failure.capability,
                failure.stage,
                failure.model,
                failure.error.replace('|', "\\|").replace('\n', " ")
            )?;
        }
        writeln!(output)?;
        Ok(())
    }

    /// @ai:intent Render the full report
    /// @ai:effects pure
    pub fn render(result: &RunResult) -> Result<String> {
        let mut output = String::new();
        Self::generate_header(result, &mut output)?;
        Self::generate_summary(&result.summary, &mut output)?;
        Self::generate_capability_table(&result.summary, &mut output)?;
        Self::generate_category_table(&result.summary, &mut output)?;
        Self::generate_failures(result, &mut output)?;
        writeln!(output, "---")?;
        write!(output, "*Generated by pairbench*")?;
        Ok(output)
    }
}

impl Default for MarkdownReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkdownReporterTrait for MarkdownReporter {
    /// @ai:intent Generate Markdown report to file
    /// @ai:effects fs:write
    fn generate(&self, result: &RunResult, output_path: &Path) -> Result<()> {
        let markdown = Self::render(result)?;
        std::fs::write(output_path, markdown)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        Ok(())
    }
}
