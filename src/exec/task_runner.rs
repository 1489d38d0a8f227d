// src/exec/task_runner.rs

//! Individual task runner.

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{ActionFailure, RuntimeEvent, TaskOutcome};
use crate::exec::action::run_action;
use crate::task::TaskDescriptor;
use crate::types::OutputMode;

/// Run a scheduled task and emit its `TaskCompleted` event.
pub async fn run_task(
    task: ScheduledTask,
    output: OutputMode,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let outcome = run_actions(&task.task, output).await;

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task.name.clone(),
            outcome,
        })
        .await
        .is_err()
    {
        error!(
            task = %task.name,
            run_id = task.run_id,
            "runtime event channel closed; completion lost"
        );
    }
}

/// Run every action of `task` strictly in declaration order.
///
/// The first failing action aborts the rest. Outputs already written by
/// earlier actions stay on disk.
pub async fn run_actions(task: &TaskDescriptor, output: OutputMode) -> TaskOutcome {
    let total = task.actions().len();

    for (index, action) in task.actions().iter().enumerate() {
        debug!(task = %task.name(), action_index = index, total, %action, "running action");

        if let Err(err) = run_action(action, output).await {
            warn!(
                task = %task.name(),
                action_index = index,
                exit_code = ?err.exit_code,
                error = %err.message,
                "action failed; aborting remaining actions"
            );
            return TaskOutcome::Failed(ActionFailure {
                action_index: index,
                exit_code: err.exit_code,
                message: err.message,
            });
        }
    }

    info!(task = %task.name(), actions = total, "task finished");
    TaskOutcome::Success
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::task::Action;

    fn recording(log: &Arc<Mutex<Vec<usize>>>, i: usize) -> Action {
        let log = Arc::clone(log);
        Action::in_process(format!("step {i}"), move || {
            log.lock().unwrap().push(i);
            Ok(())
        })
    }

    #[tokio::test]
    async fn failure_aborts_remaining_actions() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let task = TaskDescriptor::builder("three_steps")
            .action(recording(&log, 0))
            .action(Action::in_process("fail", || anyhow::bail!("disk full")))
            .action(recording(&log, 2))
            .build()
            .unwrap();

        let outcome = run_actions(&task, OutputMode::Capture).await;

        match outcome {
            TaskOutcome::Failed(f) => {
                assert_eq!(f.action_index, 1);
                assert!(f.message.contains("disk full"));
            }
            TaskOutcome::Success => panic!("expected failure"),
        }
        assert_eq!(*log.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn actions_run_in_declaration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let task = TaskDescriptor::builder("ordered")
            .actions((0..4).map(|i| recording(&log, i)))
            .build()
            .unwrap();

        assert_eq!(run_actions(&task, OutputMode::Capture).await, TaskOutcome::Success);
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3]);
    }
}
