// src/pipeline.rs

//! High-level entry point for Rust callers.
//!
//! A [`Pipeline`] owns a validated [`TaskGraph`] and the filesystem used
//! to probe and clean artifacts. Each call to [`Pipeline::run`] is an
//! independent execution: per-run state is created fresh, and only the
//! artifacts on disk carry over to the next run.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::clean::{CleanReport, Cleaner};
use crate::dag::{Scheduler, TaskGraph};
use crate::engine::{CoreRuntime, RunReport, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::{PipegraphError, Result};
use crate::exec::{ExecutorBackend, RealExecutorBackend};
use crate::fs::{FileSystem, RealFileSystem};
use crate::task::{TaskDescriptor, TaskName};
use crate::types::RunOptions;

#[derive(Debug, Clone)]
pub struct Pipeline {
    graph: Arc<TaskGraph>,
    fs: Arc<dyn FileSystem>,
}

impl Pipeline {
    /// Build and validate the graph for `tasks`.
    pub fn new(tasks: Vec<TaskDescriptor>) -> Result<Self> {
        Ok(Self::from_graph(TaskGraph::build(tasks)?))
    }

    pub fn from_graph(graph: TaskGraph) -> Self {
        Self {
            graph: Arc::new(graph),
            fs: Arc::new(RealFileSystem),
        }
    }

    /// Probe and clean artifacts through `fs` instead of the real filesystem.
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Execute the graph (or `options.targets` and their predecessors).
    pub async fn run(&self, options: &RunOptions) -> Result<RunReport> {
        self.run_until(options, std::future::pending()).await
    }

    /// Like [`Pipeline::run`], but cancels the run once `cancel` resolves:
    /// running tasks finish, nothing new starts.
    pub async fn run_until<C>(&self, options: &RunOptions, cancel: C) -> Result<RunReport>
    where
        C: Future<Output = ()> + Send + 'static,
    {
        let output = options.output;
        self.run_with(
            options,
            |tx| RealExecutorBackend::new(tx, output),
            cancel,
        )
        .await
    }

    /// Run with a caller-supplied executor backend. `make_executor` receives
    /// the sender on which the backend must report `TaskCompleted` events.
    pub async fn run_with<E, F, C>(
        &self,
        options: &RunOptions,
        make_executor: F,
        cancel: C,
    ) -> Result<RunReport>
    where
        E: ExecutorBackend,
        F: FnOnce(mpsc::Sender<RuntimeEvent>) -> E,
        C: Future<Output = ()> + Send + 'static,
    {
        if options.jobs == 0 {
            return Err(PipegraphError::ConfigError(
                "jobs must be >= 1 (got 0)".to_string(),
            ));
        }

        let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
        let executor = make_executor(rt_tx.clone());

        let cancel_tx = rt_tx;
        let canceller = tokio::spawn(async move {
            cancel.await;
            debug!("cancellation requested");
            let _ = cancel_tx.send(RuntimeEvent::CancelRequested).await;
        });

        let scheduler = Scheduler::new(self.graph.clone(), self.fs.clone(), options.jobs);
        let core = CoreRuntime::new(
            scheduler,
            RuntimeOptions {
                fail_fast: options.fail_fast,
            },
        );

        let result = Runtime::new(core, rt_rx, executor)
            .run(&options.targets)
            .await;
        canceller.abort();

        if let Ok(report) = &result {
            info!(summary = ?report.summary(), "run finished");
        }
        result
    }

    pub fn cleaner(&self) -> Cleaner {
        Cleaner::new(self.graph.clone(), self.fs.clone())
    }

    /// Clean `names`; with `cascade`, also everything downstream of them.
    pub async fn clean(&self, names: &[TaskName], cascade: bool) -> Result<CleanReport> {
        self.cleaner().clean_many(names, cascade).await
    }

    pub async fn clean_all(&self) -> CleanReport {
        self.cleaner().clean_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TaskStatus;
    use crate::fs::mock::{MockFileSystem, at};
    use crate::task::Action;

    #[tokio::test]
    async fn up_to_date_graph_runs_nothing() {
        let fs = MockFileSystem::new();
        fs.add_file("in.txt", at(1));
        fs.add_file("out.txt", at(2));

        let pipeline = Pipeline::new(vec![
            TaskDescriptor::builder("copy")
                .action(Action::process("cp", ["in.txt", "out.txt"]))
                .input("in.txt")
                .output("out.txt")
                .build()
                .unwrap(),
        ])
        .unwrap()
        .with_file_system(Arc::new(fs));

        let report = pipeline.run(&RunOptions::default()).await.unwrap();
        assert!(report.ran().is_empty());
        assert_eq!(report.status_of("copy"), Some(&TaskStatus::SkippedUpToDate));
    }

    #[tokio::test]
    async fn zero_jobs_is_rejected() {
        let pipeline = Pipeline::new(vec![]).unwrap();
        let options = RunOptions {
            jobs: 0,
            ..RunOptions::default()
        };
        let err = pipeline.run(&options).await.unwrap_err();
        assert!(matches!(err, PipegraphError::ConfigError(_)));
    }

    #[tokio::test]
    async fn unknown_target_is_an_error() {
        let pipeline = Pipeline::new(vec![]).unwrap();
        let options = RunOptions {
            targets: vec!["nope".into()],
            ..RunOptions::default()
        };
        let err = pipeline.run(&options).await.unwrap_err();
        assert!(matches!(err, PipegraphError::TaskNotFound(_)));
    }
}
