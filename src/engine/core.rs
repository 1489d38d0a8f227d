// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - sending `ScheduledTask`s to the executor
//!
//! The core is unit tested without any Tokio, channels or processes; the
//! only IO it performs is probing artifacts through the scheduler's
//! filesystem.

use crate::dag::Scheduler;
use crate::engine::event_handlers::{
    commands_from_step, handle_cancel, handle_task_completion, CoreStep,
};
use crate::engine::{RunReport, RuntimeEvent, RuntimeOptions, TaskName};
use crate::errors::Result;

/// Pure core runtime state: the scheduler plus runtime options.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler, options: RuntimeOptions) -> Self {
        Self { scheduler, options }
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Begin a run over `targets` (empty = whole graph).
    pub fn start(&mut self, targets: &[TaskName]) -> Result<CoreStep> {
        let step = self.scheduler.start_run(targets)?;
        Ok(commands_from_step(step))
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted { task, outcome } => {
                handle_task_completion(&mut self.scheduler, &self.options, task, outcome)
            }
            RuntimeEvent::CancelRequested => handle_cancel(&mut self.scheduler),
        }
    }

    pub fn report(&self) -> RunReport {
        self.scheduler.report()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::dag::TaskGraph;
    use crate::engine::{ActionFailure, CoreCommand, TaskOutcome, TaskStatus};
    use crate::fs::mock::MockFileSystem;
    use crate::task::{Action, TaskDescriptor};

    fn core(fail_fast: bool) -> CoreRuntime {
        let tasks = vec![
            TaskDescriptor::builder("a")
                .action(Action::process("false", Vec::<String>::new()))
                .build()
                .unwrap(),
            TaskDescriptor::builder("b")
                .action(Action::process("true", Vec::<String>::new()))
                .build()
                .unwrap(),
            TaskDescriptor::builder("c")
                .action(Action::process("true", Vec::<String>::new()))
                .task_deps(["a"])
                .build()
                .unwrap(),
        ];
        let graph = Arc::new(TaskGraph::build(tasks).unwrap());
        let scheduler = Scheduler::new(graph, Arc::new(MockFileSystem::new()), 1);
        CoreRuntime::new(scheduler, RuntimeOptions { fail_fast })
    }

    fn failed() -> TaskOutcome {
        TaskOutcome::Failed(ActionFailure {
            action_index: 0,
            exit_code: Some(1),
            message: String::new(),
        })
    }

    #[test]
    fn failure_continues_by_default() {
        let mut core = core(false);
        core.start(&[]).unwrap();

        let step = core.step(RuntimeEvent::TaskCompleted {
            task: "a".into(),
            outcome: failed(),
        });
        assert!(step.keep_running);
        assert!(matches!(
            step.commands.as_slice(),
            [CoreCommand::DispatchTasks(tasks)] if tasks[0].name == "b"
        ));
    }

    #[test]
    fn fail_fast_blocks_dependents_and_cancels_the_rest() {
        let mut core = core(true);
        core.start(&[]).unwrap();

        let step = core.step(RuntimeEvent::TaskCompleted {
            task: "a".into(),
            outcome: failed(),
        });
        assert!(!step.keep_running);
        assert!(matches!(step.commands.as_slice(), [CoreCommand::Finish]));
        let report = core.report();
        assert!(matches!(report.status_of("a"), Some(TaskStatus::Failed(_))));
        assert_eq!(report.status_of("b"), Some(&TaskStatus::SkippedCancelled));
        assert_eq!(report.status_of("c"), Some(&TaskStatus::SkippedBlocked));
    }

    #[test]
    fn cancel_when_idle_stops_immediately() {
        let mut core = core(false);
        let step = core.step(RuntimeEvent::CancelRequested);
        assert!(!step.keep_running);
        assert!(step.commands.is_empty());
    }
}
