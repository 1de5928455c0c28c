//! @ai:module:intent Judge verdicts and the swap-order reconciliation
//! @ai:module:layer domain
//! @ai:module:public_api Winner, Verdict, ReconciledVerdict, reconcile
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Reasons kept from one raw judge reply
pub const MAX_RAW_REASONS: usize = 8;
/// Reasons kept after combining both judge runs
pub const MAX_FINAL_REASONS: usize = 6;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

/// @ai:intent Which candidate the judge preferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "tie")]
    Tie,
}

impl Winner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Winner::A => "A",
            Winner::B => "B",
            Winner::Tie => "tie",
        }
    }

    /// @ai:intent Strict parse of the judge's winner tag
    /// @ai:effects pure
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "A" => Some(Winner::A),
            "B" => Some(Winner::B),
            "tie" => Some(Winner::Tie),
            _ => None,
        }
    }

    /// @ai:intent Map a label from the swapped presentation back to original labels
    /// @ai:effects pure
    pub fn swapped(self) -> Self {
        match self {
            Winner::A => Winner::B,
            Winner::B => Winner::A,
            Winner::Tie => Winner::Tie,
        }
    }
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// @ai:intent One normalized judge reply, labels relative to the order shown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub winner: Winner,
    #[serde(rename = "score_A")]
    pub score_a: f64,
    #[serde(rename = "score_B")]
    pub score_b: f64,
    pub reasons: Vec<String>,
}

impl Verdict {
    /// @ai:intent Deterministic verdict used when the judge never produced parseable output
    /// @ai:effects pure
    pub fn fallback_tie(reason: impl Into<String>) -> Self {
        Self {
            winner: Winner::Tie,
            score_a: 0.0,
            score_b: 0.0,
            reasons: vec![reason.into()],
        }
    }
}

/// @ai:intent Final per-case verdict in original labels, with both raw replies kept for audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledVerdict {
    pub winner: Winner,
    #[serde(rename = "score_A")]
    pub score_a: f64,
    #[serde(rename = "score_B")]
    pub score_b: f64,
    pub reasons: Vec<String>,
    pub raw_direct: Verdict,
    pub raw_swapped: Verdict,
}

/// @ai:intent Combine the direct-order and swapped-order verdicts
/// @ai:post winner is Tie whenever the two runs disagree after remapping
/// @ai:post scores lie in [0, 10], rounded to one decimal
/// @ai:effects pure
pub fn reconcile(direct: &Verdict, swapped: &Verdict) -> ReconciledVerdict {
    let remapped = swapped.winner.swapped();
    let winner = if direct.winner == remapped {
        direct.winner
    } else {
        Winner::Tie
    };

    // In the swapped run "A" was the original B.
    let score_a = round_one_decimal((direct.score_a + swapped.score_b) / 2.0);
    let score_b = round_one_decimal((direct.score_b + swapped.score_a) / 2.0);

    ReconciledVerdict {
        winner,
        score_a: clamp_score(score_a),
        score_b: clamp_score(score_b),
        reasons: merge_reasons(&direct.reasons, &swapped.reasons),
        raw_direct: direct.clone(),
        raw_swapped: swapped.clone(),
    }
}

/// @ai:intent Concatenate, drop duplicates keeping first occurrence, cap length
/// @ai:effects pure
fn merge_reasons(first: &[String], second: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    first
        .iter()
        .chain(second)
        .filter(|reason| seen.insert(reason.as_str()))
        .take(MAX_FINAL_REASONS)
        .cloned()
        .collect()
}

/// @ai:intent Round half away from zero to one decimal place
/// @ai:effects pure
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// @ai:intent Clamp to [0, 10]; NaN becomes 0
/// @ai:effects pure
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        MIN_SCORE
    } else {
        value.clamp(MIN_SCORE, MAX_SCORE)
    }
}
