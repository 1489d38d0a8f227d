// src/exec/executor_loop.rs

//! Main executor loop that manages running tasks.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::task_runner::run_task;
use crate::types::OutputMode;

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ScheduledTask>` is what the runtime (or
/// `RealExecutorBackend`) uses to hand over tasks. Each scheduled task runs
/// in its own Tokio task; the scheduler already bounds how many are in
/// flight. Per task name there is never more than one runner at a time.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    output: OutputMode,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        let mut active: HashMap<String, JoinHandle<()>> = HashMap::new();

        while let Some(task) = rx.recv().await {
            active.retain(|_, handle| !handle.is_finished());

            if active.contains_key(&task.name) {
                warn!(
                    task = %task.name,
                    run_id = task.run_id,
                    "task already running; ignoring duplicate scheduling request"
                );
                continue;
            }

            let name = task.name.clone();
            let rt_tx = runtime_tx.clone();
            let handle = tokio::spawn(async move {
                let spawn_name = task.name.clone();
                run_task(task, output, rt_tx).await;
                debug!(task = %spawn_name, "task runner future finished");
            });
            active.insert(name, handle);
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
