// src/engine/mod.rs

//! Orchestration engine for pipegraph.
//!
//! This module ties together:
//! - the per-run scheduler (what is stale, what is ready, what is blocked)
//! - the executor that runs task actions
//! - the runtime event loop that reacts to:
//!   - task completion events
//!   - cancellation requests
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

pub use crate::task::TaskName;

/// Outcome of executing a task's actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed(ActionFailure),
}

/// Runtime options used by the core.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Cancel every task that has not started yet after the first failure.
    pub fail_fast: bool,
}

/// Events flowing into the runtime from the executor and the caller.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task's actions finished with a concrete outcome.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Let running tasks finish, start nothing new (e.g. Ctrl-C).
    CancelRequested,
}

pub mod core;
pub mod event_handlers;
pub mod report;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use report::{ActionFailure, RunReport, RunSummary, TaskReport, TaskStatus};
pub use runtime::Runtime;
