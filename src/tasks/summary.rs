//! Task 1: bullet-point summary of the Act.

use super::{Task, TaskOutcome};
use crate::error::TaskError;
use crate::pipeline::gateway::ModelGateway;
use crate::prompts::{summary_prompt, summary_schema};
use tracing::info;

/// Bullet shown in place of a summary the model could not produce.
pub const SUMMARY_FAILURE: &str = "Error: Could not generate summary.";

/// Ask for 5–10 bullets covering purpose, definitions, eligibility,
/// obligations and enforcement.
///
/// Bullets are kept exactly as the model returned them. An empty list counts
/// as a failure: the report must always show at least one bullet.
pub async fn summarize(
    gateway: &ModelGateway,
    text: &str,
    max_chars: usize,
) -> TaskOutcome<Vec<String>> {
    info!("Starting task: summary");
    match gateway
        .request::<Vec<String>>(summary_prompt(text, max_chars), summary_schema())
        .await
    {
        Ok(reply) => {
            let result = if reply.value.is_empty() {
                Err(TaskError::EmptySummary)
            } else {
                Ok(reply.value)
            };
            TaskOutcome {
                task: Task::Summary,
                result,
                input_tokens: reply.input_tokens,
                output_tokens: reply.output_tokens,
            }
        }
        Err(e) => TaskOutcome::failed(Task::Summary, TaskError::gateway("summary", e)),
    }
}

/// The single-bullet sentinel used when the summary task fails.
pub fn fallback_summary() -> Vec<String> {
    vec![SUMMARY_FAILURE.to_string()]
}
