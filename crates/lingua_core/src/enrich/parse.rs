//! Best-effort extraction of the enrichment object from free model text.
//!
//! Models wrap JSON in markdown fences or prose, or drop fields. Each field
//! is read independently so one bad field does not discard the rest; any
//! reply without a JSON object yields the empty result.

use crate::enrich::{EnrichmentResult, SuggestedLink};
use crate::model::document::{Axis, AxisRole, RepresentationType};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static FENCED_BLOCK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("valid fenced block regex")
});

/// Parses a model reply into an enrichment result, falling back to empty.
pub fn parse_enrichment(text: &str) -> EnrichmentResult {
    let Some(object) = extract_json_object(text) else {
        return EnrichmentResult::default();
    };

    EnrichmentResult {
        representation_type: object
            .get("representation_type")
            .and_then(Value::as_str)
            .and_then(|value| value.parse::<RepresentationType>().ok()),
        suggested_layers: string_list(object.get("suggested_layers")),
        axes: object
            .get("axes")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(parse_axis).collect())
            .unwrap_or_default(),
        tags: string_list(object.get("tags")),
        links: object
            .get("links")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(parse_link).collect())
            .unwrap_or_default(),
    }
}

/// Returns the first complete JSON object found in `text`.
///
/// Tries, in order: the whole text, the first fenced code block, and the
/// first brace-balanced `{...}` span (braces inside strings are ignored).
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    let trimmed = text.trim();
    if let Ok(Value::Object(object)) = serde_json::from_str(trimmed) {
        return Some(object);
    }

    if let Some(block) = FENCED_BLOCK_RE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
    {
        if let Ok(Value::Object(object)) = serde_json::from_str(block.as_str()) {
            return Some(object);
        }
    }

    let start = trimmed.find('{')?;
    let mut depth = 0i64;
    let mut in_string = false;
    let mut escape = false;
    for (index, ch) in trimmed.char_indices().skip_while(|(index, _)| *index < start) {
        if in_string {
            match ch {
                _ if escape => escape = false,
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return match serde_json::from_str(&trimmed[start..=index]) {
                        Ok(Value::Object(object)) => Some(object),
                        _ => None,
                    };
                }
            }
            _ => {}
        }
    }
    None
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut out: Vec<String> = Vec::new();
    for item in items.iter().filter_map(Value::as_str).map(str::trim) {
        if !item.is_empty() && !out.iter().any(|existing| existing == item) {
            out.push(item.to_string());
        }
    }
    out
}

fn parse_axis(value: &Value) -> Option<Axis> {
    let axis = value.get("axis")?.as_str()?.trim();
    if axis.is_empty() {
        return None;
    }
    let role = value.get("role")?.as_str()?.parse::<AxisRole>().ok()?;
    let dual_term = value
        .get("dual_term")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();
    Some(Axis {
        axis: axis.to_string(),
        role,
        dual_term,
    })
}

fn parse_link(value: &Value) -> Option<SuggestedLink> {
    let term = value.get("term")?.as_str()?.trim();
    if term.is_empty() {
        return None;
    }
    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .unwrap_or("related")
        .trim()
        .to_string();
    Some(SuggestedLink {
        kind,
        term: term.to_string(),
    })
}
