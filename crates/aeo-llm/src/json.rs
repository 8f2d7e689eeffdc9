//! Tolerant JSON decoding for model output.
//!
//! Models occasionally wrap JSON in markdown fences, leave trailing commas,
//! or stop before closing every object. [`parse_json_lenient`] handles those
//! cases before giving up.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::LlmError;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid regex"));

/// Removes a surrounding ```` ```json ```` / ```` ``` ```` fence, if present.
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (`json`, `javascript`, ...) on the opening line.
    let rest = rest.find('\n').map_or(rest, |idx| &rest[idx + 1..]);
    rest.trim_end()
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

/// Removes trailing commas and closes any brackets left open, innermost
/// first. String contents are respected when counting brackets.
#[must_use]
pub fn repair_json(text: &str) -> String {
    let mut repaired = TRAILING_COMMA.replace_all(text.trim(), "$1").into_owned();

    let mut open: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in repaired.chars() {
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
            '"' => in_string = true,
            '{' => open.push('}'),
            '[' => open.push(']'),
            '}' | ']' => {
                if open.last() == Some(&c) {
                    open.pop();
                }
            }
            _ => {}
        }
    }

    if in_string {
        repaired.push('"');
    }
    // A dangling comma may be exposed once the string is closed.
    let trimmed_len = repaired.trim_end().trim_end_matches(',').len();
    repaired.truncate(trimmed_len);
    while let Some(closer) = open.pop() {
        repaired.push(closer);
    }
    repaired
}

/// Parses model output as `T`, retrying with fences stripped and the JSON
/// repaired when the first attempt fails.
///
/// # Errors
///
/// Returns [`LlmError::Deserialize`] with the error from the repaired
/// attempt when neither parse succeeds.
pub fn parse_json_lenient<T: DeserializeOwned>(text: &str, context: &str) -> Result<T, LlmError> {
    if let Ok(value) = serde_json::from_str::<T>(text) {
        return Ok(value);
    }

    let repaired = repair_json(strip_code_fences(text));
    serde_json::from_str::<T>(&repaired).map_err(|source| {
        tracing::warn!(context, error = %source, "model output is not valid JSON after repair");
        LlmError::Deserialize {
            context: context.to_owned(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn strips_json_fence() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_code_fences("```\n[1,2]\n```  "), "[1,2]");
    }

    #[test]
    fn leaves_unfenced_text() {
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
    }

    #[test]
    fn repair_removes_trailing_commas() {
        assert_eq!(repair_json(r#"{"a": [1, 2,], }"#), r#"{"a": [1, 2]}"#);
    }

    #[test]
    fn repair_closes_in_nesting_order() {
        let repaired = repair_json(r#"{"a": {"b": [1, 2"#);
        assert_eq!(repaired, r#"{"a": {"b": [1, 2]}}"#);
        let v: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(v["a"]["b"][1], 2);
    }

    #[test]
    fn repair_ignores_brackets_inside_strings() {
        let repaired = repair_json(r#"{"note": "use {curly} and [square"#);
        let v: Value = serde_json::from_str(&repaired).unwrap();
        assert_eq!(v["note"], "use {curly} and [square");
    }

    #[test]
    fn lenient_parse_accepts_valid_json() {
        let v: Value = parse_json_lenient(r#"{"ok":true}"#, "test").unwrap();
        assert_eq!(v, json!({"ok": true}));
    }

    #[test]
    fn lenient_parse_handles_fenced_truncated_output() {
        let raw = "```json\n{\"brandName\": \"Acme\", \"tags\": [\"a\", \"b\",\n```";
        let v: Value = parse_json_lenient(raw, "profile").unwrap();
        assert_eq!(v["brandName"], "Acme");
        assert_eq!(v["tags"], json!(["a", "b"]));
    }

    #[test]
    fn lenient_parse_reports_context_on_failure() {
        let err = parse_json_lenient::<Value>("not json at all", "evaluation").unwrap_err();
        match err {
            LlmError::Deserialize { context, .. } => assert_eq!(context, "evaluation"),
            other => panic!("expected Deserialize, got {other:?}"),
        }
    }
}
