//! @ai:module:intent Win/tie/loss accumulation and the end-of-run statistical reduction
//! @ai:module:layer application
//! @ai:module:public_api StatsAccumulator, summarize
//! @ai:module:stateless false

use crate::judge::Winner;
use crate::metrics::types::{
    CapabilitySummary, CapabilityTally, CaseResult, CategoryTally, ModelSummary, RunSummary,
};
use std::collections::BTreeMap;

/// @ai:intent Per-model, per-capability and per-category counters for one two-model run
/// @ai:invariant wins + ties + losses per (model, capability) equals cases committed for it
#[derive(Debug, Clone)]
pub struct StatsAccumulator {
    model_a: String,
    model_b: String,
    tallies_a: BTreeMap<String, CapabilityTally>,
    tallies_b: BTreeMap<String, CapabilityTally>,
    by_category: BTreeMap<String, BTreeMap<String, CategoryTally>>,
    total_cases: usize,
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Win,
    Tie,
    Loss,
}

impl StatsAccumulator {
    /// @ai:intent Zeroed counters for both models on every capability
    /// @ai:pre model_a != model_b
    pub fn new(model_a: impl Into<String>, model_b: impl Into<String>, capabilities: &[String]) -> Self {
        let zeroed: BTreeMap<String, CapabilityTally> = capabilities
            .iter()
            .map(|cap| (cap.clone(), CapabilityTally::default()))
            .collect();

        Self {
            model_a: model_a.into(),
            model_b: model_b.into(),
            tallies_a: zeroed.clone(),
            tallies_b: zeroed,
            by_category: BTreeMap::new(),
            total_cases: 0,
        }
    }

    pub fn total_cases(&self) -> usize {
        self.total_cases
    }

    pub fn tally(&self, model: &str, capability: &str) -> Option<&CapabilityTally> {
        if model == self.model_a {
            self.tallies_a.get(capability)
        } else if model == self.model_b {
            self.tallies_b.get(capability)
        } else {
            None
        }
    }

    pub fn category(&self, category: &str) -> Option<&BTreeMap<String, CategoryTally>> {
        self.by_category.get(category)
    }

    /// @ai:intent Apply every capability result of one test case together
    /// @ai:post total_cases grows by one when results is non-empty
    /// @ai:effects mutation
    pub fn commit_case(&mut self, results: &[CaseResult]) {
        if results.is_empty() {
            return;
        }
        for result in results {
            self.record(result);
        }
        self.total_cases += 1;
    }

    fn record(&mut self, result: &CaseResult) {
        let category = self
            .by_category
            .entry(result.category.clone())
            .or_insert_with(|| {
                BTreeMap::from([
                    (self.model_a.clone(), CategoryTally::default()),
                    (self.model_b.clone(), CategoryTally::default()),
                ])
            });

        let (outcome_a, outcome_b) = match result.winner() {
            Winner::A => {
                bump_category(category, &self.model_a, |t| t.wins += 1);
                (Outcome::Win, Outcome::Loss)
            }
            Winner::B => {
                bump_category(category, &self.model_b, |t| t.wins += 1);
                (Outcome::Loss, Outcome::Win)
            }
            Winner::Tie => {
                bump_category(category, &self.model_a, |t| t.ties += 1);
                bump_category(category, &self.model_b, |t| t.ties += 1);
                (Outcome::Tie, Outcome::Tie)
            }
        };

        apply(
            self.tallies_a.entry(result.capability.clone()).or_default(),
            outcome_a,
            result.verdict.score_a,
        );
        apply(
            self.tallies_b.entry(result.capability.clone()).or_default(),
            outcome_b,
            result.verdict.score_b,
        );
    }

    /// @ai:intent Reduce the counters into a RunSummary
    /// @ai:effects pure
    pub fn summarize(&self) -> RunSummary {
        summarize(
            [
                (self.model_a.as_str(), &self.tallies_a),
                (self.model_b.as_str(), &self.tallies_b),
            ],
            &self.by_category,
            self.total_cases,
        )
    }
}

fn apply(tally: &mut CapabilityTally, outcome: Outcome, score: f64) {
    match outcome {
        Outcome::Win => tally.wins += 1,
        Outcome::Tie => tally.ties += 1,
        Outcome::Loss => tally.losses += 1,
    }
    tally.scores.push(score);
}

fn bump_category(
    tallies: &mut BTreeMap<String, CategoryTally>,
    model: &str,
    bump: impl FnOnce(&mut CategoryTally),
) {
    bump(tallies.entry(model.to_string()).or_default());
}

/// @ai:intent Averages, totals and overall winner from the two models' counters
/// @ai:post overall_winner is "tie" unless one model has strictly more total wins
/// @ai:effects pure
pub fn summarize(
    models: [(&str, &BTreeMap<String, CapabilityTally>); 2],
    by_category: &BTreeMap<String, BTreeMap<String, CategoryTally>>,
    total_cases: usize,
) -> RunSummary {
    let summaries: Vec<(String, ModelSummary)> = models
        .iter()
        .map(|(name, tallies)| (name.to_string(), summarize_model(tallies)))
        .collect();

    let overall_winner = {
        let (name_a, a) = &summaries[0];
        let (name_b, b) = &summaries[1];
        if a.total_wins > b.total_wins {
            name_a.clone()
        } else if b.total_wins > a.total_wins {
            name_b.clone()
        } else {
            "tie".to_string()
        }
    };

    RunSummary {
        total_test_cases: total_cases,
        model_order: summaries.iter().map(|(name, _)| name.clone()).collect(),
        models: summaries.into_iter().collect(),
        by_category: by_category.clone(),
        overall_winner,
    }
}

fn summarize_model(tallies: &BTreeMap<String, CapabilityTally>) -> ModelSummary {
    let by_capability = tallies
        .iter()
        .map(|(cap, tally)| {
            (
                cap.clone(),
                CapabilitySummary {
                    wins: tally.wins,
                    ties: tally.ties,
                    losses: tally.losses,
                    avg_score: round_two(average(tally.scores.iter().copied())),
                },
            )
        })
        .collect();

    ModelSummary {
        total_wins: tallies.values().map(|t| t.wins).sum(),
        total_ties: tallies.values().map(|t| t.ties).sum(),
        total_losses: tallies.values().map(|t| t.losses).sum(),
        avg_score: round_two(average(
            tallies.values().flat_map(|t| t.scores.iter().copied()),
        )),
        by_capability,
    }
}

/// @ai:intent Calculate average of an iterator of f64
/// @ai:effects pure
fn average<I: Iterator<Item = f64>>(iter: I) -> f64 {
    let (sum, count) = iter.fold((0.0, 0u32), |(s, c), v| (s + v, c + 1));

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn round_two(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
