//! @ai:module:intent Extract and normalize the structured verdict from a raw judge reply
//! @ai:module:layer domain
//! @ai:module:public_api parse_reply, normalize
//! @ai:module:stateless true

use crate::judge::verdict::{clamp_score, Verdict, Winner, MAX_RAW_REASONS};
use serde_json::Value;

/// @ai:intent Parse a judge reply into a JSON value, tolerating code fences and surrounding prose
/// @ai:post None only when no candidate slice is valid JSON
/// @ai:effects pure
pub fn parse_reply(reply: &str) -> Option<Value> {
    let trimmed = reply.trim();

    let mut candidates = Vec::with_capacity(3);
    if let Some(fenced) = fenced_block(trimmed) {
        candidates.push(fenced);
    }
    candidates.push(trimmed);
    if let Some(object) = outer_object(trimmed) {
        candidates.push(object);
    }

    candidates
        .into_iter()
        .find_map(|candidate| serde_json::from_str::<Value>(candidate).ok())
}

/// @ai:intent Contents of the first ```json fence, else the first plain ``` fence
/// @ai:effects pure
fn fenced_block(reply: &str) -> Option<&str> {
    let rest = match reply.find("```json") {
        Some(start) => &reply[start + "```json".len()..],
        None => {
            let start = reply.find("```")?;
            &reply[start + 3..]
        }
    };
    let end = rest.find("```")?;
    let body = rest[..end].trim();
    if body.is_empty() {
        None
    } else {
        Some(body)
    }
}

/// @ai:intent Slice from the first '{' to the last '}'
/// @ai:effects pure
fn outer_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&reply[start..=end])
}

/// @ai:intent Coerce any parsed payload into a well-formed Verdict
/// @ai:post winner in {A, B, tie}; scores in [0, 10]; at most 8 reasons
/// @ai:effects pure
pub fn normalize(payload: &Value) -> Verdict {
    let Some(object) = payload.as_object() else {
        return Verdict::fallback_tie("Invalid judge output (not an object).");
    };

    let winner = object
        .get("winner")
        .and_then(Value::as_str)
        .and_then(Winner::parse)
        .unwrap_or(Winner::Tie);

    Verdict {
        winner,
        score_a: coerce_score(object.get("score_A")),
        score_b: coerce_score(object.get("score_B")),
        reasons: coerce_reasons(object.get("reasons")),
    }
}

/// @ai:intent Numbers and numeric strings become clamped scores; anything else is 0
fn coerce_score(value: Option<&Value>) -> f64 {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    clamp_score(raw)
}

fn coerce_reasons(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .take(MAX_RAW_REASONS)
            .map(value_to_text)
            .collect(),
        Some(other) => vec![value_to_text(other)],
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
