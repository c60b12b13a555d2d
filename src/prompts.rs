//! Prompt templates and response schemas for the three analysis tasks.
//!
//! Centralising every prompt here serves two purposes:
//!
//! 1. **Single source of truth** — changing what a task asks the model for
//!    requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect prompts and schemas directly
//!    without a live inference service.
//!
//! Every prompt embeds the document text through [`truncate_text`], so no
//! request ever carries more than [`MAX_INPUT_CHARS`] characters of the Act.

use serde_json::{json, Value};

/// Maximum number of characters of document text embedded in any prompt.
pub const MAX_INPUT_CHARS: usize = 15_000;

/// The six fixed compliance rules, in report order.
pub const RULES: [&str; 6] = [
    "Act must define key terms",
    "Act must specify eligibility criteria",
    "Act must specify responsibilities of the administering authority",
    "Act must include enforcement or penalties",
    "Act must include payment calculation or entitlement structure",
    "Act must include record-keeping or reporting requirements",
];

/// Value the model is told to use for a category absent from the text.
pub const NOT_FOUND: &str = "Not Found in Text";

/// System directive sent with every structured request.
///
/// The placeholder `{schema}` is replaced with the pretty-printed schema.
pub const JSON_DIRECTIVE: &str = r#"You are a legal analysis assistant. Respond ONLY with valid JSON that conforms exactly to the following JSON schema. Do not wrap the JSON in markdown fences and do not add commentary.

Schema:
{schema}"#;

/// Render [`JSON_DIRECTIVE`] for a concrete schema.
pub fn json_directive(schema: &Value) -> String {
    let rendered = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
    JSON_DIRECTIVE.replace("{schema}", &rendered)
}

/// Keep at most `max_chars` characters of `text`.
///
/// Counts Unicode scalar values rather than bytes, so the cut never lands
/// inside a multi-byte character. The cut may fall mid-word.
pub fn truncate_text(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

fn text_block(text: &str, max_chars: usize) -> String {
    format!(
        "Analyze the following legal text from the Universal Credit Act 2025:\n\
         --- TEXT START ---\n\
         {}\n\
         --- TEXT END ---",
        truncate_text(text, max_chars)
    )
}

// ── Task 1: summary ──────────────────────────────────────────────────────

/// Prompt for the bullet-point summary.
pub fn summary_prompt(text: &str, max_chars: usize) -> String {
    format!(
        "{}\n\n\
         Provide a summary of the entire Act in 5-10 concise bullet points. \
         Focus specifically on the following elements:\n\
         - Purpose\n\
         - Key definitions\n\
         - Eligibility\n\
         - Obligations\n\
         - Enforcement elements\n\n\
         Return the result as a single JSON list of strings, where each string is a bullet point summary.",
        text_block(text, max_chars)
    )
}

/// Schema for the summary: an array of strings.
pub fn summary_schema() -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" }
    })
}

// ── Task 2: key sections ─────────────────────────────────────────────────

/// Prompt for the seven-category key-section extraction.
pub fn key_sections_prompt(text: &str, max_chars: usize) -> String {
    format!(
        "{}\n\n\
         Your task is to extract the key legislative text (verbatim sections or highly accurate summaries) \
         related to the following categories.\n\
         Return the response as a single JSON object matching the required structure. \
         If a section is not found, state \"{NOT_FOUND}\".\n\n\
         Categories to extract:\n\
         1. Definitions\n\
         2. Obligations (of the recipient/claimant)\n\
         3. Responsibilities (of the administering authority)\n\
         4. Eligibility (criteria for claimants)\n\
         5. Payments / Entitlements (calculation or structure)\n\
         6. Penalties / Enforcement (provisions and sanctions)\n\
         7. Record-keeping / Reporting (requirements for the authority or claimant)",
        text_block(text, max_chars)
    )
}

/// Schema for the key sections: an object with all seven fields required.
pub fn key_sections_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "definitions": { "type": "string", "description": "Key definitions from the Act." },
            "obligations": { "type": "string", "description": "Obligations of the claimant/recipient." },
            "responsibilities": { "type": "string", "description": "Responsibilities of the administering authority." },
            "eligibility": { "type": "string", "description": "Eligibility criteria for claimants." },
            "payments": { "type": "string", "description": "Payment/entitlement calculation structure." },
            "penalties": { "type": "string", "description": "Penalties and enforcement provisions." },
            "record_keeping": { "type": "string", "description": "Record-keeping and reporting requirements." }
        },
        "required": [
            "definitions",
            "obligations",
            "responsibilities",
            "eligibility",
            "payments",
            "penalties",
            "record_keeping"
        ]
    })
}

// ── Task 3: rule checks ──────────────────────────────────────────────────

/// Prompt for the six rule checks.
pub fn rule_checks_prompt(text: &str, max_chars: usize) -> String {
    let rules = RULES
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{}. {}", i + 1, r))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\n\n\
         Check the Act against the following {} rules. For each rule, determine if it 'pass' or 'fail'.\n\
         Provide a specific, concise piece of text from the Act as 'evidence' to justify your status.\n\
         Assign a 'confidence' score (0-100) for your determination.\n\n\
         Rules to check (answer in this exact order, copying each rule text verbatim into 'rule'):\n\
         {}\n\n\
         Return the result as a single JSON list of objects, where each object strictly follows \
         the provided schema for a single rule check result.",
        text_block(text, max_chars),
        RULES.len(),
        rules
    )
}

/// Schema for the rule checks: an array of verdict objects.
pub fn rule_checks_schema() -> Value {
    json!({
        "type": "array",
        "items": {
            "type": "object",
            "properties": {
                "rule": { "type": "string", "description": "The specific rule being checked." },
                "status": { "type": "string", "enum": ["pass", "fail"], "description": "Result: 'pass' or 'fail'." },
                "evidence": { "type": "string", "description": "A short quote or section reference proving the status." },
                "confidence": { "type": "integer", "minimum": 0, "maximum": 100, "description": "Confidence level in the status (0-100)." }
            },
            "required": ["rule", "status", "evidence", "confidence"]
        }
    })
}
