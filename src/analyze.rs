//! Top-level analysis entry points.
//!
//! ```text
//! path ──▶ resolve_local ──▶ extract_text ──▶ run_analysis ──▶ write_report
//!          (magic bytes)     (pdfium)         (3 tasks)        (indented JSON)
//! ```
//!
//! Extraction failure stops the run before any inference call. Client
//! initialisation failure is not an `Err` here: it comes back as
//! [`CompiledReport::Aborted`] so the caller can show the message the same
//! way it shows a report.

use crate::config::AnalysisConfig;
use crate::error::AnalyzerError;
use crate::pipeline::{extract, input};
use crate::report::{run_analysis, to_indented_json, CompiledReport};
use crate::tasks::Task;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// File name of the report written by the upload surface.
pub const REPORT_FILE_NAME: &str = "final_structured_report.json";

/// Outcome of one run: the compiled report plus accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRun {
    pub report: CompiledReport,
    pub stats: AnalysisStats,
}

/// Accounting for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Characters of text extracted from the document (before truncation).
    pub extracted_chars: usize,
    pub total_input_tokens: usize,
    pub total_output_tokens: usize,
    /// Tasks whose slot holds a placeholder instead of a real result.
    pub failed_tasks: Vec<Task>,
    pub extraction_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Analyse already-extracted document text.
pub async fn analyze_text(text: &str, config: &AnalysisConfig) -> AnalysisRun {
    let start = Instant::now();
    let (report, compile) = run_analysis(text, config).await;
    AnalysisRun {
        report,
        stats: AnalysisStats {
            extracted_chars: text.chars().count(),
            total_input_tokens: compile.total_input_tokens,
            total_output_tokens: compile.total_output_tokens,
            failed_tasks: compile.failed_tasks,
            extraction_duration_ms: 0,
            total_duration_ms: start.elapsed().as_millis() as u64,
        },
    }
}

/// Extract the text of an in-memory PDF, then analyse it.
///
/// # Errors
/// [`AnalyzerError::Extraction`] when the document yields no text layer at
/// all (corrupt file, non-PDF bytes, PDF engine unavailable). No inference
/// request is made in that case.
pub async fn analyze_bytes(
    bytes: Vec<u8>,
    config: &AnalysisConfig,
) -> Result<AnalysisRun, AnalyzerError> {
    let start = Instant::now();
    let text = extract::extract_text(bytes).await?;
    let extraction_duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Extracted {} chars in {}ms",
        text.chars().count(),
        extraction_duration_ms
    );

    let mut run = analyze_text(&text, config).await;
    run.stats.extraction_duration_ms = extraction_duration_ms;
    run.stats.total_duration_ms = start.elapsed().as_millis() as u64;
    Ok(run)
}

/// Read a local PDF, then analyse it.
pub async fn analyze_file(
    path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisRun, AnalyzerError> {
    let path = path.as_ref();
    info!("Starting analysis: {}", path.display());
    let bytes = input::resolve_local(path).await?;
    analyze_bytes(bytes, config).await
}

/// Synchronous wrapper around [`analyze_file`].
///
/// Creates a temporary Tokio runtime internally.
pub fn analyze_file_sync(
    path: impl AsRef<Path>,
    config: &AnalysisConfig,
) -> Result<AnalysisRun, AnalyzerError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AnalyzerError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(analyze_file(path, config))
}

/// Write `report` to `path` as 4-space-indented UTF-8 JSON.
///
/// Parent directories are created as needed and an existing file is
/// overwritten. Returns the exact text written.
pub async fn write_report(
    report: &CompiledReport,
    path: impl AsRef<Path>,
) -> Result<String, AnalyzerError> {
    let path = path.as_ref();
    let json = to_indented_json(report)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AnalyzerError::ReportWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }

    tokio::fs::write(path, json.as_bytes())
        .await
        .map_err(|e| AnalyzerError::ReportWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    debug!("Report written to {} ({} bytes)", path.display(), json.len());
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EXTRACTION_ERROR_MARKER;
    use crate::pipeline::gateway::testing::ScriptedBackend;
    use crate::report::FinalReport;
    use crate::tasks::{fallback_rule_checks, fallback_summary, KeySectionsSlot};
    use std::sync::Arc;

    #[tokio::test]
    async fn extraction_failure_skips_inference() {
        let backend = Arc::new(ScriptedBackend::new());
        let config = AnalysisConfig::builder()
            .backend(backend.clone())
            .build()
            .unwrap();
        let err = analyze_bytes(b"not a pdf".to_vec(), &config)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with(EXTRACTION_ERROR_MARKER));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn analyze_text_counts_chars_and_failures() {
        let config = AnalysisConfig::builder()
            .backend(Arc::new(ScriptedBackend::new()))
            .build()
            .unwrap();
        let run = analyze_text("ünïcode", &config).await;
        assert_eq!(run.stats.extracted_chars, 7);
        assert_eq!(run.stats.failed_tasks.len(), 3);
        assert!(!run.report.is_aborted());
    }

    #[tokio::test]
    async fn write_report_matches_returned_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(REPORT_FILE_NAME);
        let report = CompiledReport::Report(FinalReport::new(
            fallback_summary(),
            KeySectionsSlot::failed(),
            fallback_rule_checks(),
        ));

        let written = write_report(&report, &path).await.unwrap();
        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, on_disk);
        assert!(on_disk.contains("\n    \"disclaimer\""));

        // Last write wins.
        let aborted = CompiledReport::Aborted {
            error: "boom".into(),
        };
        write_report(&aborted, &path).await.unwrap();
        let on_disk = std::fs::read_to_string(&path).unwrap();
        assert_eq!(on_disk, "{\n    \"error\": \"boom\"\n}");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let config = AnalysisConfig::default();
        let err = analyze_file("/no/such/act.pdf", &config).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::FileNotFound { .. }));
    }
}
