//! @ai:module:intent Judge prompt rendering
//! @ai:module:layer domain
//! @ai:module:public_api render_judge_prompt, CORRECTIVE_INSTRUCTION
//! @ai:module:stateless true

/// Follow-up sent after a reply that could not be parsed
pub const CORRECTIVE_INSTRUCTION: &str =
    "Your previous output was not valid JSON. Output ONLY strict JSON per the schema.";

/// @ai:intent Fill the comparison template; responses appear under the labels given
/// @ai:effects pure
pub fn render_judge_prompt(
    role: &str,
    transcript: &str,
    response_a: &str,
    response_b: &str,
) -> String {
    format!(
        r#"You are evaluating two assistant responses in the role of: {role}

Pick the better response based on:
1) Task accuracy & completeness
2) Safe handling of constraints and edge cases
3) Appropriate clarifying questions (ask when needed; avoid excessive questions)
4) Natural, helpful tone (polite, concise, professional)
5) Memory across turns (no contradictions; respects earlier constraints)
6) Actionability (clear next steps; offers alternatives when needed)

Return STRICT JSON (no markdown), schema exactly:
{{"winner":"A"|"B"|"tie","score_A":0-10,"score_B":0-10,"reasons":[string,...]}}

Conversation (multi-turn user messages):
{transcript}

Response A:
{response_a}

Response B:
{response_b}
"#
    )
}
