//! Progress-callback trait for per-task analysis events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::config::AnalysisConfigBuilder::progress_callback`] to receive
//! events as the compiler runs the summary, key-section and rule-check tasks.
//! The CLI uses it to drive a terminal progress bar; library users can forward
//! events anywhere.
//!
//! # Example
//!
//! ```rust
//! use act_analyzer::{AnalysisConfig, AnalysisProgressCallback, Task};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl AnalysisProgressCallback for CountingCallback {
//!     fn on_task_complete(&self, task: Task) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{} done", task.label());
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = AnalysisConfig::builder()
//!     .progress_callback(counter as Arc<dyn AnalysisProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::tasks::Task;
use std::sync::Arc;

/// Called by the report compiler as it runs each task.
///
/// Implementations must be `Send + Sync`: with concurrent tasks (the default)
/// `on_task_start`, `on_task_complete` and `on_task_error` may interleave.
/// All methods have default no-op implementations.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called once before any task starts.
    fn on_analysis_start(&self, total_tasks: usize) {
        let _ = total_tasks;
    }

    /// Called just before the task's request is sent.
    fn on_task_start(&self, task: Task) {
        let _ = task;
    }

    /// Called when a task produced a real (non-sentinel) result.
    fn on_task_complete(&self, task: Task) {
        let _ = task;
    }

    /// Called when a task failed and its sentinel was substituted.
    fn on_task_error(&self, task: Task, error: &str) {
        let _ = (task, error);
    }

    /// Called once after all tasks have been attempted.
    fn on_analysis_complete(&self, total_tasks: usize, success_count: usize) {
        let _ = (total_tasks, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::AnalysisConfig`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
