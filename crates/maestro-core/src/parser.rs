//! Plan parser: extracts a step array from raw model output.
//!
//! Model output is untrusted. It may wrap the JSON array in prose or
//! markdown fences, truncate mid-array, emit malformed elements, or contain
//! no JSON at all. Parsing therefore never fails: any unrecoverable input
//! degrades to a single synthetic step carrying the original prompt, so the
//! orchestrator always has something runnable.

use log::debug;
use serde_json::Value;

use crate::models::PlanStep;

/// Parse raw model output into a non-empty list of plan steps.
pub fn parse_plan(raw: &str, original_prompt: &str) -> Vec<PlanStep> {
    let Some(json) = extract_json_array(raw) else {
        debug!("no JSON array found in model output, using fallback plan");
        return fallback_plan(original_prompt);
    };

    let value: Value = match serde_json::from_str(&json) {
        Ok(value) => value,
        Err(e) => {
            debug!("extracted JSON failed to parse ({e}), using fallback plan");
            return fallback_plan(original_prompt);
        }
    };

    let Value::Array(items) = value else {
        return fallback_plan(original_prompt);
    };

    let steps: Vec<PlanStep> = items
        .iter()
        .enumerate()
        .map(|(pos, item)| coerce_step(item, pos))
        .collect();

    if steps.is_empty() {
        fallback_plan(original_prompt)
    } else {
        steps
    }
}

/// The synthetic plan used when nothing usable could be extracted: one
/// pending step that hands the original request straight to the executor.
pub fn fallback_plan(original_prompt: &str) -> Vec<PlanStep> {
    vec![PlanStep::new(
        1,
        "Execute request",
        original_prompt,
        false,
        original_prompt,
    )]
}

/// Locate the first top-level JSON array in `raw` by bracket-depth scanning.
///
/// Brackets inside string literals are ignored. If the array is truncated
/// (depth never returns to zero), the missing closing brackets are appended
/// as a best-effort repair; a truncated element will still fail the JSON
/// parse and fall back.
fn extract_json_array(raw: &str) -> Option<String> {
    let start = raw.find('[')?;
    let candidate = &raw[start..];

    let mut depth: usize = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in candidate.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(candidate[..=offset].to_string());
                }
            }
            _ => {}
        }
    }

    // Truncated output: append the missing closers.
    let mut repaired = candidate.to_string();
    if in_string {
        repaired.push('"');
    }
    repaired.extend(std::iter::repeat(']').take(depth));
    Some(repaired)
}

/// Map one array element onto a step, filling any missing or mistyped field
/// with its default. `pos` is the element's 0-based position.
fn coerce_step(item: &Value, pos: usize) -> PlanStep {
    let index = item
        .get("index")
        .and_then(coerce_u32)
        .unwrap_or(pos as u32 + 1);
    let title = item
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Step {}", pos + 1));
    let intent = coerce_string(item.get("intent"));
    let instruction = coerce_string(item.get("instruction"));
    let side_effects = item
        .get("sideEffects")
        .map(coerce_bool)
        .unwrap_or(false);

    PlanStep::new(index, title, intent, side_effects, instruction)
}

fn coerce_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
