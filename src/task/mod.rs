//! Per-target tasks and the worker pool that runs them
//!
//! A [`TaskWorker`] turns one (target URL, selector) pair into a written
//! navigation map or a dead-letter entry. The [`ConcurrencyManager`] runs
//! many of them on a bounded pool and gathers one [`TaskResult`] per pair.

mod manager;
mod worker;

pub use manager::ConcurrencyManager;
pub use worker::TaskWorker;

use std::fmt;
use std::path::PathBuf;

/// Outcome of one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskResult {
    /// The map was written to `output_path`
    Success { target: String, output_path: PathBuf },

    /// The task failed permanently and was recorded in the dead-letter log
    DeadLettered { target: String, error: String },

    /// The task was aborted or its join failed before it produced a result
    TransientError { target: String, error: String },
}

impl TaskResult {
    pub fn target(&self) -> &str {
        match self {
            Self::Success { target, .. }
            | Self::DeadLettered { target, .. }
            | Self::TransientError { target, .. } => target,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Error message for failed tasks
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::DeadLettered { error, .. } | Self::TransientError { error, .. } => Some(error),
        }
    }
}

impl fmt::Display for TaskResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success {
                target,
                output_path,
            } => write!(f, "SUCCESS {} -> {}", target, output_path.display()),
            Self::DeadLettered { target, error } => write!(f, "DEAD-LETTERED {}: {}", target, error),
            Self::TransientError { target, error } => write!(f, "ERROR {}: {}", target, error),
        }
    }
}

/// Outcome counts for a batch of tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub dead_lettered: usize,
    pub errors: usize,
}

impl RunSummary {
    pub fn from_results(results: &[TaskResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            summary.total += 1;
            match result {
                TaskResult::Success { .. } => summary.succeeded += 1,
                TaskResult::DeadLettered { .. } => summary.dead_lettered += 1,
                TaskResult::TransientError { .. } => summary.errors += 1,
            }
            summary
        })
    }

    /// True when every task succeeded
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} task(s): {} succeeded, {} dead-lettered, {} errored",
            self.total, self.succeeded, self.dead_lettered, self.errors
        )
    }
}
