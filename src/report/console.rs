//! @ai:module:intent Plain-text tables for the terminal
//! @ai:module:layer infrastructure
//! @ai:module:public_api summary_table, comparison_table
//! @ai:module:stateless true

use crate::metrics::RunResult;

const RULE_WIDTH: usize = 72;

/// @ai:intent End-of-run summary: one row per model, then the winner
/// @ai:effects pure
pub fn summary_table(result: &RunResult) -> String {
    let summary = &result.summary;
    let mut lines = vec![
        "=".repeat(RULE_WIDTH),
        format!("  Benchmark: {}", result.name),
        "=".repeat(RULE_WIDTH),
        format!(
            "{:<36} {:>8} {:>8} {:>8} {:>8}",
            "Model", "Wins", "Ties", "Losses", "Score"
        ),
        "-".repeat(RULE_WIDTH),
    ];

    for name in &summary.model_order {
        if let Some(stats) = summary.models.get(name) {
            lines.push(format!(
                "{:<36} {:>8} {:>8} {:>8} {:>8.2}",
                name, stats.total_wins, stats.total_ties, stats.total_losses, stats.avg_score
            ));
        }
    }

    lines.push("-".repeat(RULE_WIDTH));
    lines.push(format!(
        "Cases judged: {}   Failed: {}",
        summary.total_test_cases,
        result.failures.len()
    ));
    lines.push(format!("Winner: {}", summary.overall_winner));
    lines.push("=".repeat(RULE_WIDTH));
    lines.join("\n")
}

/// @ai:intent Side-by-side view of several saved runs
/// @ai:effects pure
pub fn comparison_table(results: &[RunResult]) -> String {
    let mut lines = vec![
        format!(
            "{:<24} {:<36} {:>6} {:>6} {:>6} {:>7}",
            "Run", "Model", "Wins", "Ties", "Losses", "Score"
        ),
        "-".repeat(90),
    ];

    for result in results {
        let label = format!("{} ({})", result.name, result.started_at.format("%Y-%m-%d"));
        for name in &result.summary.model_order {
            if let Some(stats) = result.summary.models.get(name) {
                let marker = if *name == result.summary.overall_winner {
                    " *"
                } else {
                    ""
                };
                lines.push(format!(
                    "{:<24} {:<36} {:>6} {:>6} {:>6} {:>7.2}{}",
                    label,
                    name,
                    stats.total_wins,
                    stats.total_ties,
                    stats.total_losses,
                    stats.avg_score,
                    marker
                ));
            }
        }
    }

    lines.push("* overall winner of the run".to_string());
    lines.join("\n")
}
