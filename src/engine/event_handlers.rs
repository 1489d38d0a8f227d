// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::info;

use crate::dag::{ScheduledTask, Scheduler, SchedulerStep};
use crate::engine::{RuntimeOptions, TaskName, TaskOutcome};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// Every participating task is terminal; the run is over.
    Finish,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Turn a scheduler step into shell commands.
pub fn commands_from_step(step: SchedulerStep) -> CoreStep {
    let mut commands = Vec::new();

    if !step.newly_scheduled.is_empty() {
        commands.push(CoreCommand::DispatchTasks(step.newly_scheduled));
    }

    let keep_running = !step.run_just_finished;
    if step.run_just_finished {
        commands.push(CoreCommand::Finish);
    }

    CoreStep {
        commands,
        keep_running,
    }
}

/// Handle a task completion event.
///
/// With `fail_fast`, a failure cancels every task that has not started;
/// otherwise the run continues with everything not downstream of the
/// failure.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    options: &RuntimeOptions,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let failed = matches!(outcome, TaskOutcome::Failed(_));

    let step = if failed && options.fail_fast && !scheduler.is_cancelled() {
        info!(task = %task, "fail-fast: cancelling tasks that have not started");
        scheduler.step_completion_and_cancel(&task, outcome)
    } else {
        scheduler.step_completion(&task, outcome)
    };

    commands_from_step(step)
}

/// Handle a cancellation request.
pub fn handle_cancel(scheduler: &mut Scheduler) -> CoreStep {
    if scheduler.is_idle() {
        return CoreStep {
            commands: Vec::new(),
            keep_running: false,
        };
    }
    commands_from_step(scheduler.cancel())
}
