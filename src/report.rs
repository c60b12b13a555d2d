//! Report compilation: run the three tasks and merge their outputs.
//!
//! [`FinalReport`] always carries its five top-level keys. A failed task is
//! represented by its sentinel value inside its own slot, never by a missing
//! slot. The only run that produces no report is one whose inference client
//! could not be initialised: that yields [`CompiledReport::Aborted`], which
//! serializes as a lone `{"error": ...}` mapping.

use crate::config::AnalysisConfig;
use crate::error::AnalyzerError;
use crate::pipeline::gateway::ModelGateway;
use crate::progress::ProgressCallback;
use crate::tasks::{
    check_rules, extract_key_sections, fallback_rule_checks, fallback_summary, summarize,
    KeySectionsSlot, RuleCheck, Task, TaskOutcome,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

pub const REPORT_TITLE: &str = "Universal Credit Act 2025 - AI Agent Analysis Report";
pub const SUMMARY_DESCRIPTION: &str =
    "5-10 point summary focusing on Purpose, Definitions, Eligibility, Obligations, and Enforcement.";
pub const RULE_CHECKS_DESCRIPTION: &str = "Analysis against 6 mandatory legislative requirements.";
pub const DISCLAIMER: &str =
    "This report is generated by an AI Agent and should be verified against the original Act.";

/// `task_1_summary` slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySection {
    pub description: String,
    pub summary_points: Vec<String>,
}

/// `task_3_rule_checks` slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleChecksSection {
    pub description: String,
    pub rule_checks: Vec<RuleCheck>,
}

/// The merged report. Field order is the serialization order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalReport {
    pub report_title: String,
    pub task_1_summary: SummarySection,
    pub task_2_key_sections: KeySectionsSlot,
    pub task_3_rule_checks: RuleChecksSection,
    pub disclaimer: String,
}

impl FinalReport {
    /// Assemble a report from already-resolved task values.
    pub fn new(
        summary_points: Vec<String>,
        key_sections: KeySectionsSlot,
        rule_checks: Vec<RuleCheck>,
    ) -> Self {
        Self {
            report_title: REPORT_TITLE.to_string(),
            task_1_summary: SummarySection {
                description: SUMMARY_DESCRIPTION.to_string(),
                summary_points,
            },
            task_2_key_sections: key_sections,
            task_3_rule_checks: RuleChecksSection {
                description: RULE_CHECKS_DESCRIPTION.to_string(),
                rule_checks,
            },
            disclaimer: DISCLAIMER.to_string(),
        }
    }

    /// 4-space-indented JSON, as written to the report file.
    pub fn to_pretty_json(&self) -> Result<String, AnalyzerError> {
        to_indented_json(self)
    }

    /// Compact JSON, as used for the download payload.
    pub fn to_compact_json(&self) -> Result<String, AnalyzerError> {
        serde_json::to_string(self)
            .map_err(|e| AnalyzerError::Internal(format!("Failed to serialise report: {e}")))
    }
}

/// Result of a run: a report, or the client-initialisation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompiledReport {
    Report(FinalReport),
    Aborted { error: String },
}

impl CompiledReport {
    pub fn is_aborted(&self) -> bool {
        matches!(self, CompiledReport::Aborted { .. })
    }

    pub fn report(&self) -> Option<&FinalReport> {
        match self {
            CompiledReport::Report(r) => Some(r),
            CompiledReport::Aborted { .. } => None,
        }
    }

    /// Convert `Aborted` into [`AnalyzerError::Aborted`] with the same message.
    pub fn into_result(self) -> Result<FinalReport, AnalyzerError> {
        match self {
            CompiledReport::Report(r) => Ok(r),
            CompiledReport::Aborted { error } => Err(AnalyzerError::Aborted { message: error }),
        }
    }
}

/// Token and failure accounting for one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileStats {
    pub total_input_tokens: usize,
    pub total_output_tokens: usize,
    pub failed_tasks: Vec<Task>,
    pub duration_ms: u64,
}

/// Run the three tasks against `text` and merge the results.
///
/// Tasks run concurrently unless `config.sequential_tasks` is set, in which
/// case they run strictly in the order summary, key sections, rule checks.
/// The report is the same either way.
pub async fn compile_report(
    gateway: &ModelGateway,
    text: &str,
    config: &AnalysisConfig,
) -> (FinalReport, CompileStats) {
    let start = Instant::now();
    let max_chars = config.max_input_chars;
    let cb = config.progress_callback.as_ref();

    if let Some(cb) = cb {
        cb.on_analysis_start(Task::ALL.len());
    }

    let (summary, sections, rules) = if config.sequential_tasks {
        let summary = tracked(cb, Task::Summary, summarize(gateway, text, max_chars)).await;
        let sections =
            tracked(cb, Task::KeySections, extract_key_sections(gateway, text, max_chars)).await;
        let rules = tracked(cb, Task::RuleChecks, check_rules(gateway, text, max_chars)).await;
        (summary, sections, rules)
    } else {
        tokio::join!(
            tracked(cb, Task::Summary, summarize(gateway, text, max_chars)),
            tracked(cb, Task::KeySections, extract_key_sections(gateway, text, max_chars)),
            tracked(cb, Task::RuleChecks, check_rules(gateway, text, max_chars)),
        )
    };

    let mut stats = CompileStats::default();
    account(&mut stats, &summary);
    account(&mut stats, &sections);
    account(&mut stats, &rules);

    let report = FinalReport::new(
        summary.resolve(fallback_summary),
        sections
            .result
            .map(KeySectionsSlot::Extracted)
            .unwrap_or_else(|_| KeySectionsSlot::failed()),
        rules.resolve(fallback_rule_checks),
    );

    stats.duration_ms = start.elapsed().as_millis() as u64;
    let succeeded = Task::ALL.len() - stats.failed_tasks.len();
    if let Some(cb) = cb {
        cb.on_analysis_complete(Task::ALL.len(), succeeded);
    }
    info!(
        "Report compiled: {}/{} tasks succeeded in {}ms",
        succeeded,
        Task::ALL.len(),
        stats.duration_ms
    );

    (report, stats)
}

/// Initialise the inference client, then compile.
///
/// Client-initialisation failure short-circuits: the result is
/// [`CompiledReport::Aborted`] and no task runs.
pub async fn run_analysis(text: &str, config: &AnalysisConfig) -> (CompiledReport, CompileStats) {
    let gateway = match ModelGateway::connect(config) {
        Ok(g) => g,
        Err(e) => {
            warn!("Inference client initialisation failed: {}", e);
            return (
                CompiledReport::Aborted {
                    error: e.to_string(),
                },
                CompileStats::default(),
            );
        }
    };
    let (report, stats) = compile_report(&gateway, text, config).await;
    (CompiledReport::Report(report), stats)
}

/// Serialize any value as JSON with 4-space indentation.
pub(crate) fn to_indented_json<T: Serialize>(value: &T) -> Result<String, AnalyzerError> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .map_err(|e| AnalyzerError::Internal(format!("Failed to serialise report: {e}")))?;
    String::from_utf8(buf).map_err(|e| AnalyzerError::Internal(e.to_string()))
}

async fn tracked<T>(
    cb: Option<&ProgressCallback>,
    task: Task,
    fut: impl std::future::Future<Output = TaskOutcome<T>>,
) -> TaskOutcome<T> {
    if let Some(cb) = cb {
        cb.on_task_start(task);
    }
    let outcome = fut.await;
    match &outcome.result {
        Ok(_) => {
            if let Some(cb) = cb {
                cb.on_task_complete(task);
            }
        }
        Err(e) => {
            warn!("{} failed, using placeholder: {}", task, e);
            if let Some(cb) = cb {
                cb.on_task_error(task, &e.to_string());
            }
        }
    }
    outcome
}

fn account<T>(stats: &mut CompileStats, outcome: &TaskOutcome<T>) {
    stats.total_input_tokens += outcome.input_tokens;
    stats.total_output_tokens += outcome.output_tokens;
    if !outcome.is_ok() {
        stats.failed_tasks.push(outcome.task);
    }
}
