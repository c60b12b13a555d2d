//! The three analysis tasks run against one document.
//!
//! Each task builds one prompt and one schema, calls the
//! [`ModelGateway`](crate::pipeline::gateway::ModelGateway) once and returns
//! an explicit `Result`. Turning an `Err` into the task's sentinel value is
//! the report compiler's job ([`crate::report`]), done uniformly for all
//! three through [`TaskOutcome::resolve`].
//!
//! The tasks share no data: each reads the same document text and nothing
//! else, so they can run in any order or concurrently.

pub mod rules;
pub mod sections;
pub mod summary;

use crate::error::TaskError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use rules::{check_rules, fallback_rule_checks, RuleCheck, RuleStatus};
pub use sections::{extract_key_sections, KeySections, KeySectionsSlot};
pub use summary::{fallback_summary, summarize};

/// Identifies one of the three analysis tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Summary,
    KeySections,
    RuleChecks,
}

impl Task {
    /// All tasks, in report order.
    pub const ALL: [Task; 3] = [Task::Summary, Task::KeySections, Task::RuleChecks];

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Task::Summary => "Summary",
            Task::KeySections => "Key sections",
            Task::RuleChecks => "Rule checks",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one task plus the tokens it spent.
#[derive(Debug, Clone)]
pub struct TaskOutcome<T> {
    pub task: Task,
    pub result: Result<T, TaskError>,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl<T> TaskOutcome<T> {
    pub(crate) fn failed(task: Task, err: TaskError) -> Self {
        Self {
            task,
            result: Err(err),
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// The real value, or `fallback()` when the task failed.
    pub fn resolve(self, fallback: impl FnOnce() -> T) -> T {
        self.result.unwrap_or_else(|_| fallback())
    }
}
