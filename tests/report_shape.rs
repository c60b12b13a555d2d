//! Offline integration tests for the public API.
//!
//! A canned [`InferenceBackend`] stands in for the inference service, so no
//! network access or API key is needed.

use act_analyzer::prompts::{NOT_FOUND, RULES};
use act_analyzer::report::{DISCLAIMER, REPORT_TITLE};
use act_analyzer::{
    analyze_text, write_report, AnalysisConfig, CompiledReport, Completion, GatewayError,
    InferenceBackend, RuleStatus, StructuredRequest, Task,
};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Answers each task from a fixed table; `broken` tasks get a transport error.
struct CannedBackend {
    broken: Vec<Task>,
    calls: AtomicUsize,
}

impl CannedBackend {
    fn healthy() -> Arc<Self> {
        Self::breaking(&[])
    }

    fn breaking(tasks: &[Task]) -> Arc<Self> {
        Arc::new(Self {
            broken: tasks.to_vec(),
            calls: AtomicUsize::new(0),
        })
    }

    fn task_for(prompt: &str) -> Option<Task> {
        if prompt.contains("Rules to check") {
            Some(Task::RuleChecks)
        } else if prompt.contains("Categories to extract") {
            Some(Task::KeySections)
        } else if prompt.contains("bullet points") {
            Some(Task::Summary)
        } else {
            None
        }
    }

    fn reply_for(task: Task) -> String {
        match task {
            Task::Summary => json!([
                "Purpose: replaces six legacy benefits with one payment",
                "Eligibility: claimants aged 18 to pension age",
                "Enforcement: sanctions for failure to meet requirements"
            ])
            .to_string(),
            Task::KeySections => json!({
                "definitions": "\"claimant\" means a person who has made a claim",
                "obligations": "Claimant commitment must be accepted",
                "responsibilities": "Secretary of State administers payments",
                "eligibility": "Section 4 basic conditions",
                "payments": "Standard allowance plus elements",
                "penalties": "Reduction of award for sanctionable failures",
                "record_keeping": NOT_FOUND,
            })
            .to_string(),
            // Wrapped in a fence to exercise reply cleanup.
            Task::RuleChecks => {
                let items: Vec<Value> = RULES
                    .iter()
                    .map(|r| json!({"rule": r, "status": "Pass", "evidence": "s.1", "confidence": 87.6}))
                    .collect();
                format!("```json\n{}\n```", Value::Array(items))
            }
        }
    }
}

impl InferenceBackend for CannedBackend {
    fn name(&self) -> &str {
        "canned"
    }

    fn complete<'a>(
        &'a self,
        request: &'a StructuredRequest,
    ) -> BoxFuture<'a, Result<Completion, GatewayError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let task = Self::task_for(&request.prompt).ok_or(GatewayError::EmptyResponse)?;
            if self.broken.contains(&task) {
                return Err(GatewayError::Request {
                    backend: "canned".into(),
                    detail: "503 Service Unavailable".into(),
                });
            }
            Ok(Completion {
                content: Self::reply_for(task),
                input_tokens: 1_000,
                output_tokens: 200,
            })
        })
    }
}

fn config(backend: Arc<CannedBackend>) -> AnalysisConfig {
    AnalysisConfig::builder().backend(backend).build().unwrap()
}

const ACT_TEXT: &str = "Universal Credit Act 2025. Part 1. Section 1: Universal credit. \
A person is entitled to universal credit if the basic conditions are met.";

#[tokio::test]
async fn healthy_run_produces_complete_report() {
    let backend = CannedBackend::healthy();
    let run = analyze_text(ACT_TEXT, &config(backend.clone())).await;

    let report = run.report.report().expect("report, not an abort");
    assert_eq!(report.report_title, REPORT_TITLE);
    assert_eq!(report.disclaimer, DISCLAIMER);
    assert_eq!(report.task_1_summary.summary_points.len(), 3);
    let sections = report.task_2_key_sections.sections().expect("sections");
    assert_eq!(sections.record_keeping, NOT_FOUND);

    let checks = &report.task_3_rule_checks.rule_checks;
    assert_eq!(checks.len(), RULES.len());
    assert!(checks.iter().all(|c| c.status == RuleStatus::Pass && c.confidence == 88));

    assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    assert_eq!(run.stats.total_input_tokens, 3_000);
    assert_eq!(run.stats.total_output_tokens, 600);
    assert!(run.stats.failed_tasks.is_empty());
}

#[tokio::test]
async fn broken_task_only_affects_its_own_slot() {
    let backend = CannedBackend::breaking(&[Task::Summary]);
    let run = analyze_text(ACT_TEXT, &config(backend)).await;

    let json = serde_json::to_value(&run.report).unwrap();
    assert_eq!(
        json["task_1_summary"]["summary_points"],
        json!(["Error: Could not generate summary."])
    );
    assert!(json["task_2_key_sections"].get("error").is_none());
    assert_eq!(json["task_3_rule_checks"]["rule_checks"][0]["status"], "pass");
    assert_eq!(run.stats.failed_tasks, vec![Task::Summary]);
}

#[tokio::test]
async fn written_report_round_trips() {
    let run = analyze_text(ACT_TEXT, &config(CannedBackend::healthy())).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out").join("report.json");

    let text = write_report(&run.report, &path).await.unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), text);

    let parsed: CompiledReport = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, run.report);
}

#[tokio::test]
async fn sequential_mode_matches_concurrent_mode() {
    let concurrent = analyze_text(ACT_TEXT, &config(CannedBackend::healthy())).await;
    let sequential = analyze_text(
        ACT_TEXT,
        &AnalysisConfig::builder()
            .backend(CannedBackend::healthy())
            .sequential_tasks(true)
            .build()
            .unwrap(),
    )
    .await;
    assert_eq!(concurrent.report, sequential.report);
}
