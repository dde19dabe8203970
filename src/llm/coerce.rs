use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{PipelineError, PipelineResult};

/// Greedy brace-to-brace span
static OBJECT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("object block pattern is valid"));

/// Extract the JSON object from a model response
///
/// Tolerates prose before or after the object, code fences, and typographic
/// quotes used as JSON delimiters. Never retries the generation itself.
pub fn coerce_object(raw: &str) -> PipelineResult<Map<String, Value>> {
    let greedy = OBJECT_BLOCK.find_iter(raw).last().map(|m| m.as_str());

    let parsed = greedy
        .and_then(parse_candidate)
        .or_else(|| {
            balanced_blocks(raw)
                .into_iter()
                .rev()
                .find_map(parse_candidate)
        })
        .or_else(|| {
            // Braces inside typographically quoted strings only read as
            // string content once the quotes are plain
            let normalized = normalize_quotes(raw);
            balanced_blocks(&normalized)
                .into_iter()
                .rev()
                .find_map(parse_object)
        });

    parsed.ok_or_else(|| PipelineError::MalformedGenerationOutput {
        raw: raw.to_string(),
    })
}

/// Parse as-is first so typographic quotes inside string values survive;
/// only normalize when the plain parse fails.
fn parse_candidate(candidate: &str) -> Option<Map<String, Value>> {
    parse_object(candidate).or_else(|| parse_object(&normalize_quotes(candidate)))
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

pub fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
            other => other,
        })
        .collect()
}

/// Top-level `{...}` blocks with balanced braces, ignoring braces in strings
fn balanced_blocks(text: &str) -> Vec<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut blocks = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if let (0, Some(s)) = (depth, start) {
                    blocks.push(&text[s..=i]);
                }
            }
            _ => {}
        }
    }

    blocks
}
