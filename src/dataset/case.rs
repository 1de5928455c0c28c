//! @ai:module:intent Test case definition for pairwise benchmarks
//! @ai:module:layer domain
//! @ai:module:public_api TestCase
//! @ai:module:stateless true

use crate::error::DataError;
use serde::{Deserialize, Serialize};

/// @ai:intent A multi-turn conversational test case, immutable once loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    #[serde(default = "default_category")]
    pub category: String,
    /// User utterances in order; never empty after validation
    pub turns: Vec<String>,
    /// Any other fields on the dataset line
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

fn default_category() -> String {
    "unknown".to_string()
}

impl TestCase {
    pub fn new(id: impl Into<String>, category: impl Into<String>, turns: Vec<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            turns,
            metadata: serde_json::Map::new(),
        }
    }

    /// @ai:intent Check the fields every capability relies on
    /// @ai:effects pure
    pub fn validate(&self) -> Result<(), DataError> {
        if self.id.trim().is_empty() {
            return Err(DataError::EmptyId);
        }

        if self.turns.is_empty() {
            return Err(DataError::NoTurns(self.id.clone()));
        }

        Ok(())
    }
}

/// @ai:intent Render user turns as "USER[n]: text" lines
/// @ai:effects pure
pub fn format_transcript(turns: &[String]) -> String {
    turns
        .iter()
        .enumerate()
        .map(|(i, turn)| format!("USER[{}]: {}", i + 1, turn))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_metadata() {
        let line = r#"{"id":"wb_0001","category":"allergy_safety","turns":["I have a peanut allergy."],"difficulty":"hard"}"#;
        let case: TestCase = serde_json::from_str(line).unwrap();
        assert_eq!(case.id, "wb_0001");
        assert_eq!(case.category, "allergy_safety");
        assert_eq!(case.metadata.get("difficulty").unwrap(), "hard");
    }

    #[test]
    fn test_missing_category_defaults_to_unknown() {
        let case: TestCase = serde_json::from_str(r#"{"id":"t1","turns":["hi"]}"#).unwrap();
        assert_eq!(case.category, "unknown");
        assert!(case.metadata.is_empty());
    }

    #[test]
    fn test_validate_rejects_empty_turns() {
        let case = TestCase::new("t1", "menu_qa", vec![]);
        assert!(matches!(case.validate(), Err(DataError::NoTurns(id)) if id == "t1"));

        let case = TestCase::new(" ", "menu_qa", vec!["hi".to_string()]);
        assert!(matches!(case.validate(), Err(DataError::EmptyId)));
    }

    #[test]
    fn test_format_transcript_numbers_turns() {
        let turns = vec!["Hi".to_string(), "What's popular?".to_string()];
        assert_eq!(
            format_transcript(&turns),
            "USER[1]: Hi\nUSER[2]: What's popular?"
        );
    }
}
