use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use pipegraph::dag::ScheduledTask;
use pipegraph::engine::{ActionFailure, RuntimeEvent, TaskOutcome};
use pipegraph::errors::Result;
use pipegraph::exec::ExecutorBackend;
use pipegraph::fs::mock::{MockFileSystem, at};
use pipegraph::task::ArtifactKind;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which tasks were "run"
/// - immediately reports `TaskCompleted` for each scheduled task: `Failed`
///   for tasks listed in [`FakeExecutor::failing`], `Success` otherwise
/// - optionally "produces" the outputs of successful tasks on a
///   [`MockFileSystem`], each with a fresh, strictly increasing mtime.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    failing: HashSet<String>,
    fs: Option<(MockFileSystem, Arc<AtomicU64>)>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: HashSet::new(),
            fs: None,
        }
    }

    pub fn failing<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing.extend(names.into_iter().map(Into::into));
        self
    }

    /// Write outputs of successful tasks to `fs`, starting at `clock` seconds.
    pub fn producing_on(mut self, fs: MockFileSystem, clock: Arc<AtomicU64>) -> Self {
        self.fs = Some((fs, clock));
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(t.name.clone());
                }

                let outcome = if self.failing.contains(&t.name) {
                    TaskOutcome::Failed(ActionFailure {
                        action_index: 0,
                        exit_code: Some(1),
                        message: format!("{} failed (fake)", t.name),
                    })
                } else {
                    if let Some((fs, clock)) = &self.fs {
                        for output in t.task.outputs() {
                            let mtime = at(clock.fetch_add(1, Ordering::SeqCst));
                            match output.kind() {
                                ArtifactKind::Directory => fs.add_dir(output.path(), mtime),
                                ArtifactKind::File | ArtifactKind::Sentinel => {
                                    fs.add_file(output.path(), mtime)
                                }
                            }
                        }
                    }
                    TaskOutcome::Success
                };

                tx.send(RuntimeEvent::TaskCompleted {
                    task: t.name.clone(),
                    outcome,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
