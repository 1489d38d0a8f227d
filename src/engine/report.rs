// src/engine/report.rs

//! Per-run results handed back to the caller.

use std::fmt;

use crate::task::TaskName;

/// Detail of the action that made a task fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    /// Zero-based index of the failing action within the task.
    pub action_index: usize,
    /// Exit code for process actions that ran to completion.
    pub exit_code: Option<i32>,
    pub message: String,
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exit_code {
            Some(code) => write!(
                f,
                "action #{} exited with status {}: {}",
                self.action_index, code, self.message
            ),
            None => write!(f, "action #{} failed: {}", self.action_index, self.message),
        }
    }
}

/// Terminal status of a task after a run.
///
/// "Did not need to run" (`SkippedUpToDate`) and "did not get to run"
/// (`SkippedBlocked`, `SkippedCancelled`) are always distinct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    Failed(ActionFailure),
    SkippedUpToDate,
    SkippedBlocked,
    SkippedCancelled,
}

impl TaskStatus {
    /// Whether dependents may proceed past this task.
    pub fn is_success(&self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::SkippedUpToDate)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed(_) => "failed",
            TaskStatus::SkippedUpToDate => "skipped-up-to-date",
            TaskStatus::SkippedBlocked => "skipped-blocked",
            TaskStatus::SkippedCancelled => "skipped-cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Failed(failure) => write!(f, "failed ({failure})"),
            other => f.write_str(other.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub name: TaskName,
    pub status: TaskStatus,
    /// Whether the task's actions were executed in this run. Grouping tasks
    /// succeed without running.
    pub ran: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub up_to_date: usize,
    pub blocked: usize,
    pub cancelled: usize,
}

/// Outcome of one graph execution, in topological order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: u64,
    pub tasks: Vec<TaskReport>,
}

impl RunReport {
    pub fn status_of(&self, name: &str) -> Option<&TaskStatus> {
        self.tasks.iter().find(|t| t.name == name).map(|t| &t.status)
    }

    /// Names of tasks whose actions executed, in topological order.
    pub fn ran(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|t| t.ran)
            .map(|t| t.name.as_str())
            .collect()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &ActionFailure)> {
        self.tasks.iter().filter_map(|t| match &t.status {
            TaskStatus::Failed(f) => Some((t.name.as_str(), f)),
            _ => None,
        })
    }

    /// True when every task either succeeded or was already up to date.
    pub fn is_success(&self) -> bool {
        self.tasks.iter().all(|t| t.status.is_success())
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for t in &self.tasks {
            match t.status {
                TaskStatus::Succeeded => summary.succeeded += 1,
                TaskStatus::Failed(_) => summary.failed += 1,
                TaskStatus::SkippedUpToDate => summary.up_to_date += 1,
                TaskStatus::SkippedBlocked => summary.blocked += 1,
                TaskStatus::SkippedCancelled => summary.cancelled += 1,
            }
        }
        summary
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for t in &self.tasks {
            writeln!(f, "{:<40} {}", t.name, t.status)?;
        }
        let s = self.summary();
        write!(
            f,
            "{} succeeded, {} failed, {} up-to-date, {} blocked, {} cancelled",
            s.succeeded, s.failed, s.up_to_date, s.blocked, s.cancelled
        )
    }
}
