//! # act-analyzer
//!
//! Turn a legislative Act (PDF) into a structured JSON report using an LLM.
//!
//! ## Why this crate?
//!
//! Reviewing an Act for its definitions, obligations and penalties is slow
//! work. This crate extracts the text layer of the PDF and asks a language
//! model three independent questions about it: a short summary, the key
//! provisions grouped into seven categories, and pass/fail verdicts against
//! six fixed drafting rules. The answers are merged into one report with a
//! fixed shape: a failed question yields a placeholder in its own slot and
//! never hides the other two answers.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    read the file, check the %PDF header
//!  ├─ 2. Extract  page text via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Tasks    summary │ key sections │ rule checks  (concurrent)
//!  ├─ 4. Compile  merge into FinalReport, placeholders for failed tasks
//!  └─ 5. Output   4-space-indented JSON (file, stdout or web page)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use act_analyzer::{analyze_file, AnalysisConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY from the environment.
//!     let config = AnalysisConfig::default();
//!     let run = analyze_file("universal_credit_act_2025.pdf", &config).await?;
//!     let report = run.report.into_result()?;
//!     println!("{}", report.to_pretty_json()?);
//!     eprintln!("failed tasks: {:?}", run.stats.failed_tasks);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `server`  | on      | The HTML upload surface ([`web`], axum + tower-http) |
//! | `cli`     | on      | The `act-analyzer` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `bundled` | off     | Embed the pdfium shared library at build time |
//!
//! Disable the defaults when using only the library:
//! ```toml
//! act-analyzer = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod tasks;
#[cfg(feature = "server")]
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{
    analyze_bytes, analyze_file, analyze_file_sync, analyze_text, write_report, AnalysisRun,
    AnalysisStats, REPORT_FILE_NAME,
};
pub use config::{AnalysisConfig, AnalysisConfigBuilder, DEFAULT_MODEL, DEFAULT_PROVIDER};
pub use error::{AnalyzerError, GatewayError, TaskError};
pub use pipeline::gateway::{
    Completion, InferenceBackend, ModelGateway, ProviderBackend, StructuredRequest,
};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use report::{compile_report, run_analysis, CompileStats, CompiledReport, FinalReport};
pub use tasks::{KeySections, KeySectionsSlot, RuleCheck, RuleStatus, Task, TaskOutcome};
