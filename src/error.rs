//! Error types for the act-analyzer library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`AnalyzerError`] — **Fatal**: the run cannot proceed at all (unreadable
//!   input, text extraction failed, inference client not configured).
//!   Returned as `Err(AnalyzerError)` from the top-level `analyze*` functions.
//!
//! * [`GatewayError`] — a single structured request to the inference service
//!   failed (transport, timeout, malformed JSON, schema violation).
//!
//! * [`TaskError`] — **Non-fatal**: one analysis task failed. The report
//!   compiler replaces the task's slot with a sentinel value so the other two
//!   tasks still appear in the report.

use std::path::PathBuf;
use thiserror::Error;

/// Prefix carried by every text-extraction failure message.
///
/// The upload surface shows the extraction message verbatim, so callers that
/// only hold the rendered string can still recognise the failure.
pub const EXTRACTION_ERROR_MARKER: &str = "ERROR";

/// All fatal errors returned by the act-analyzer library.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// Text could not be extracted from the document.
    #[error("ERROR: Could not extract text from PDF. Details: {detail}")]
    Extraction { detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The inference client could not be initialised (missing API key etc.).
    #[error("Failed to initialize {provider} API client. {hint}")]
    ClientInit { provider: String, hint: String },

    /// A run that was aborted before any task, carrying its original message.
    #[error("{message}")]
    Aborted { message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the report file.
    #[error("Failed to write report file '{path}': {source}")]
    ReportWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AnalyzerError {
    /// Whether this error came from the text-extraction stage.
    pub fn is_extraction(&self) -> bool {
        matches!(self, AnalyzerError::Extraction { .. })
    }
}

/// Failure of one structured request to the inference service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// The provider returned an error (network, auth, quota, bad request).
    #[error("inference request to '{backend}' failed: {detail}")]
    Request { backend: String, detail: String },

    /// The call did not finish within the configured timeout.
    #[error("inference request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The provider answered with no content.
    #[error("inference service returned an empty response")]
    EmptyResponse,

    /// The reply was not valid JSON.
    #[error("response is not valid JSON: {detail}")]
    MalformedJson { detail: String },

    /// The reply was JSON but did not match the requested shape.
    #[error("response does not match the requested schema: {detail}")]
    SchemaMismatch { detail: String },
}

/// A non-fatal error for a single analysis task.
#[derive(Debug, Clone, Error, PartialEq, Eq, serde::Serialize)]
pub enum TaskError {
    /// The gateway call failed.
    #[error("{task}: {detail}")]
    Gateway { task: String, detail: String },

    /// The model answered with an empty bullet list.
    #[error("summary: model returned no bullet points")]
    EmptySummary,

    /// The model did not return one verdict per rule.
    #[error("rule checks: expected {expected} verdicts, got {actual}")]
    RuleCountMismatch { expected: usize, actual: usize },

    /// The verdicts could not be paired one-to-one with the fixed rules.
    #[error("rule checks: verdicts do not match the fixed rules ({detail})")]
    RuleMismatch { detail: String },
}

impl TaskError {
    pub(crate) fn gateway(task: &str, err: GatewayError) -> Self {
        TaskError::Gateway {
            task: task.to_string(),
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_message_carries_marker() {
        let e = AnalyzerError::Extraction {
            detail: "invalid header".into(),
        };
        let msg = e.to_string();
        assert!(msg.starts_with(EXTRACTION_ERROR_MARKER), "got: {msg}");
        assert_eq!(
            msg,
            "ERROR: Could not extract text from PDF. Details: invalid header"
        );
        assert!(e.is_extraction());
    }

    #[test]
    fn client_init_display() {
        let e = AnalyzerError::ClientInit {
            provider: "gemini".into(),
            hint: "Check your GEMINI_API_KEY.".into(),
        };
        assert_eq!(
            e.to_string(),
            "Failed to initialize gemini API client. Check your GEMINI_API_KEY."
        );
        assert!(!e.is_extraction());
    }

    #[test]
    fn aborted_displays_message_unchanged() {
        let e = AnalyzerError::Aborted {
            message: "Failed to initialize gemini API client. Check your GEMINI_API_KEY.".into(),
        };
        assert_eq!(
            e.to_string(),
            "Failed to initialize gemini API client. Check your GEMINI_API_KEY."
        );
    }

    #[test]
    fn gateway_timeout_display() {
        let e = GatewayError::Timeout { secs: 120 };
        assert!(e.to_string().contains("120s"));
    }

    #[test]
    fn task_error_wraps_gateway_detail() {
        let e = TaskError::gateway("summary", GatewayError::EmptyResponse);
        let msg = e.to_string();
        assert!(msg.starts_with("summary: "), "got: {msg}");
        assert!(msg.contains("empty response"));
    }

    #[test]
    fn rule_count_mismatch_display() {
        let e = TaskError::RuleCountMismatch {
            expected: 6,
            actual: 4,
        };
        assert!(e.to_string().contains("expected 6"));
        assert!(e.to_string().contains("got 4"));
    }

    #[test]
    fn task_error_serializes_for_reporting() {
        let e = TaskError::RuleMismatch {
            detail: "unknown rule 'x'".into(),
        };
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["RuleMismatch"]["detail"], "unknown rule 'x'");
    }
}
