//! Post-processing: deterministic cleanup of model replies before JSON parsing.
//!
//! Even when told to answer with bare JSON, models occasionally:
//!
//! - wrap the payload in ` ```json ... ``` ` fences
//! - prepend a byte-order mark or zero-width space
//! - add a sentence of commentary before or after the payload
//!
//! This module strips those artefacts without touching the payload itself.
//!
//! ## Rule Order
//!
//! Fences are stripped before the payload is sliced out, so a fenced reply
//! with commentary inside the fence still yields the inner JSON.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a raw model reply.
///
/// Rules (applied in order):
/// 1. Trim surrounding whitespace and invisible characters
/// 2. Strip outer code fences (with or without a `json` language tag)
/// 3. Slice out the outermost JSON array or object when prose surrounds it
pub fn clean_json_reply(input: &str) -> String {
    let s = trim_invisible(input);
    let s = strip_code_fences(s);
    let s = trim_invisible(&s);
    slice_json_payload(s).to_string()
}

// ── Rule 1: Trim invisible characters ────────────────────────────────────────

const INVISIBLE: [char; 6] = [
    '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
];

fn trim_invisible(input: &str) -> &str {
    input.trim_matches(|c: char| c.is_whitespace() || INVISIBLE.contains(&c))
}

// ── Rule 2: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\r?\n(.*?)\r?\n?```$").unwrap());

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 3: Slice out the JSON payload ───────────────────────────────────────

fn slice_json_payload(input: &str) -> &str {
    if input.starts_with('[') || input.starts_with('{') {
        return input;
    }
    let start = match input.find(['[', '{']) {
        Some(i) => i,
        None => return input,
    };
    let close = if input[start..].starts_with('[') { ']' } else { '}' };
    match input.rfind(close) {
        Some(end) if end > start => &input[start..=end],
        _ => input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences() {
        let input = "```json\n[\"a\", \"b\"]\n```";
        assert_eq!(clean_json_reply(input), "[\"a\", \"b\"]");
    }

    #[test]
    fn test_strip_fences_no_lang() {
        let input = "```\n{\"k\": 1}\n```";
        assert_eq!(clean_json_reply(input), "{\"k\": 1}");
    }

    #[test]
    fn test_plain_json_passthrough() {
        let input = "  {\"k\": \"v\"}\n";
        assert_eq!(clean_json_reply(input), "{\"k\": \"v\"}");
    }

    #[test]
    fn test_leading_bom_removed() {
        let input = "\u{FEFF}[1, 2]";
        assert_eq!(clean_json_reply(input), "[1, 2]");
    }

    #[test]
    fn test_invisible_chars_inside_payload_kept() {
        let input = "[\"co\u{00AD}operate\"]";
        assert_eq!(clean_json_reply(input), input);
    }

    #[test]
    fn test_commentary_around_payload() {
        let input = "Here is the result:\n[{\"rule\": \"x\"}]\nHope this helps!";
        assert_eq!(clean_json_reply(input), "[{\"rule\": \"x\"}]");
    }

    #[test]
    fn test_commentary_inside_fence() {
        let input = "```json\nSure:\n{\"a\": [1]}\n```";
        assert_eq!(clean_json_reply(input), "{\"a\": [1]}");
    }

    #[test]
    fn test_no_json_returned_unchanged() {
        assert_eq!(clean_json_reply("I cannot help with that."), "I cannot help with that.");
        assert_eq!(clean_json_reply(""), "");
    }
}
