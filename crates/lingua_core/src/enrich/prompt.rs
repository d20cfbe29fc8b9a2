//! Prompt text sent to the hosted model.

/// Fixed instruction preamble; the reply contract is a single JSON object.
pub const SYSTEM_PREAMBLE: &str = r#"You classify glossary terms for a layered personal glossary.
Reply with ONE JSON object and nothing else, using exactly these keys:
{
  "representation_type": "state" | "event" | "action" | "modality" | null,
  "suggested_layers": [string],
  "axes": [{"axis": string, "role": "A" | "B", "dual_term": string}],
  "tags": [string],
  "links": [{"kind": string, "term": string}]
}
Use empty arrays or null when unsure. Do not invent definitions."#;

/// Builds the user message for one term.
pub fn build_user_prompt(term: &str, definition: &str) -> String {
    let definition = definition.trim();
    let definition = if definition.is_empty() {
        "(no definition given)"
    } else {
        definition
    };
    format!("Term: {}\nDefinition: {}", term.trim(), definition)
}
