// src/dag/task_info.rs

//! Per-run task states and the scheduled task type.

use std::sync::Arc;

use crate::engine::{ActionFailure, TaskName, TaskStatus};
use crate::task::TaskDescriptor;

/// Per-run state of a task participating in the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Waiting on predecessors.
    Pending,
    /// Predecessors done and judged stale; waiting for a free job slot.
    Queued,
    /// Dispatched to the executor.
    Running,
    Succeeded,
    Failed(ActionFailure),
    SkippedUpToDate,
    /// A predecessor failed (or was itself blocked).
    SkippedBlocked,
    SkippedCancelled,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        self.status().is_some()
    }

    /// Terminal status for the run report; `None` while still in flight.
    pub fn status(&self) -> Option<TaskStatus> {
        match self {
            RunState::Pending | RunState::Queued | RunState::Running => None,
            RunState::Succeeded => Some(TaskStatus::Succeeded),
            RunState::Failed(f) => Some(TaskStatus::Failed(f.clone())),
            RunState::SkippedUpToDate => Some(TaskStatus::SkippedUpToDate),
            RunState::SkippedBlocked => Some(TaskStatus::SkippedBlocked),
            RunState::SkippedCancelled => Some(TaskStatus::SkippedCancelled),
        }
    }
}

/// Description of a task that the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub task: Arc<TaskDescriptor>,
    /// Identifier shared by every task of the same graph execution.
    pub run_id: u64,
}

impl ScheduledTask {
    pub fn new(task: Arc<TaskDescriptor>, run_id: u64) -> Self {
        Self {
            name: task.name().to_string(),
            task,
            run_id,
        }
    }
}
