// src/clean/mod.rs

//! Cleanup engine.
//!
//! Removes task outputs on explicit request. Tasks are always cleaned in
//! reverse topological order so consumers go before their producers.
//! A failure on one target never stops the remaining removals; every
//! target gets its own [`RemovalOutcome`].

use std::collections::HashSet;
use std::io;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::TaskGraph;
use crate::errors::{PipegraphError, Result};
use crate::exec::run_action;
use crate::fs::FileSystem;
use crate::task::{Artifact, ArtifactKind, CleanupAction, TaskDescriptor, TaskName};
use crate::types::OutputMode;

mod report;

pub use report::{CleanEntry, CleanReport, RemovalOutcome, TaskCleanReport};

#[derive(Debug, Clone)]
pub struct Cleaner {
    graph: Arc<TaskGraph>,
    fs: Arc<dyn FileSystem>,
    output: OutputMode,
}

impl Cleaner {
    pub fn new(graph: Arc<TaskGraph>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            graph,
            fs,
            output: OutputMode::default(),
        }
    }

    /// Output handling for `CleanupAction::Run` actions.
    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    /// Clean a single task.
    pub async fn clean(&self, name: &str) -> Result<CleanReport> {
        self.clean_many(&[name.to_string()], false).await
    }

    /// Clean the named tasks; with `cascade`, also every task that
    /// transitively depends on them.
    pub async fn clean_many(&self, names: &[TaskName], cascade: bool) -> Result<CleanReport> {
        if let Some(unknown) = names.iter().find(|n| !self.graph.contains(n)) {
            return Err(PipegraphError::TaskNotFound(unknown.clone()));
        }

        let selected: HashSet<TaskName> = if cascade {
            self.graph.with_dependents(names.iter().map(String::as_str))
        } else {
            names.iter().cloned().collect()
        };

        info!(tasks = selected.len(), cascade, "cleaning tasks");
        Ok(self.clean_selected(&selected).await)
    }

    /// Clean every task in the graph.
    pub async fn clean_all(&self) -> CleanReport {
        let all: HashSet<TaskName> = self.graph.iter_topological().map(str::to_string).collect();
        info!(tasks = all.len(), "cleaning all tasks");
        self.clean_selected(&all).await
    }

    async fn clean_selected(&self, selected: &HashSet<TaskName>) -> CleanReport {
        let mut report = CleanReport::default();
        for name in self.graph.iter_topological().rev() {
            if !selected.contains(name) {
                continue;
            }
            let Some(task) = self.graph.task(name) else {
                continue;
            };
            report.tasks.push(self.clean_task(task).await);
        }
        report
    }

    async fn clean_task(&self, task: &TaskDescriptor) -> TaskCleanReport {
        let mut entries = Vec::new();

        if task.cleanup().is_empty() {
            self.remove_targets(task, &mut entries);
        }

        for action in task.cleanup() {
            match action {
                CleanupAction::RemoveTargets => self.remove_targets(task, &mut entries),
                CleanupAction::RemovePath(artifact) => entries.push(CleanEntry {
                    target: artifact.to_string(),
                    outcome: self.remove(artifact),
                }),
                CleanupAction::Run(action) => {
                    let outcome = match run_action(action, self.output).await {
                        Ok(()) => RemovalOutcome::Removed,
                        Err(e) => RemovalOutcome::RemovalError(e.message),
                    };
                    entries.push(CleanEntry {
                        target: action.to_string(),
                        outcome,
                    });
                }
            }
        }

        for entry in &entries {
            match &entry.outcome {
                RemovalOutcome::RemovalError(msg) => {
                    warn!(task = %task.name(), target = %entry.target, error = %msg, "cleanup failed")
                }
                outcome => {
                    debug!(task = %task.name(), target = %entry.target, %outcome, "cleanup target")
                }
            }
        }

        TaskCleanReport {
            task: task.name().to_string(),
            entries,
        }
    }

    fn remove_targets(&self, task: &TaskDescriptor, entries: &mut Vec<CleanEntry>) {
        for output in task.outputs() {
            entries.push(CleanEntry {
                target: output.to_string(),
                outcome: self.remove(output),
            });
        }
    }

    fn remove(&self, artifact: &Artifact) -> RemovalOutcome {
        let path = artifact.path();
        let result = if artifact.kind() == ArtifactKind::Directory || self.fs.is_dir(path) {
            self.fs.remove_dir_all(path)
        } else {
            self.fs.remove_file(path)
        };

        match result {
            Ok(()) => RemovalOutcome::Removed,
            Err(e) if e.kind() == io::ErrorKind::NotFound => RemovalOutcome::AlreadyAbsent,
            Err(e) => RemovalOutcome::RemovalError(e.to_string()),
        }
    }
}
