// src/dag/state_manager.rs

//! Per-run state transitions for tasks in the scheduler.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::dag::staleness::{self, Staleness};
use crate::dag::task_info::{RunState, ScheduledTask};
use crate::dag::TaskGraph;
use crate::engine::TaskName;
use crate::fs::ArtifactProbe;

/// How far a pending task's predecessors have progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Waiting,
    Satisfied,
    Blocked,
    Cancelled,
}

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a TaskGraph,
    states: &'a mut HashMap<TaskName, RunState>,
    probe: &'a ArtifactProbe,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a TaskGraph,
        states: &'a mut HashMap<TaskName, RunState>,
        probe: &'a ArtifactProbe,
    ) -> Self {
        Self {
            graph,
            states,
            probe,
        }
    }

    /// Reset per-run state: exactly `participants` are `Pending`.
    pub fn mark_pending(&mut self, participants: &HashSet<TaskName>) {
        self.states.clear();
        for name in participants {
            self.states.insert(name.clone(), RunState::Pending);
        }
    }

    fn readiness(&self, name: &str) -> Readiness {
        let mut waiting = false;
        for pred in self.graph.predecessors(name) {
            match self.states.get(pred) {
                Some(RunState::Succeeded) | Some(RunState::SkippedUpToDate) => {}
                Some(RunState::Failed(_)) | Some(RunState::SkippedBlocked) => {
                    return Readiness::Blocked;
                }
                Some(RunState::SkippedCancelled) => return Readiness::Cancelled,
                Some(RunState::Pending) | Some(RunState::Queued) | Some(RunState::Running) => {
                    waiting = true;
                }
                None => {
                    // Participants are closed under predecessors.
                    warn!(task = %name, dep = %pred, "predecessor not part of this run");
                    waiting = true;
                }
            }
        }
        if waiting {
            Readiness::Waiting
        } else {
            Readiness::Satisfied
        }
    }

    /// Settle every pending task whose predecessors are all terminal.
    ///
    /// Grouping tasks succeed, up-to-date tasks are skipped, stale tasks are
    /// queued, and tasks behind a failure are blocked. Walking in
    /// topological order settles whole chains in one pass.
    ///
    /// Returns the tasks that reached a terminal state without running.
    pub fn resolve_pending(&mut self) -> Vec<TaskName> {
        let graph = self.graph;
        let mut settled = Vec::new();

        for name in graph.iter_topological() {
            if self.states.get(name) != Some(&RunState::Pending) {
                continue;
            }

            let next = match self.readiness(name) {
                Readiness::Waiting => continue,
                Readiness::Blocked => {
                    info!(task = %name, "predecessor failed; skipping task");
                    RunState::SkippedBlocked
                }
                Readiness::Cancelled => RunState::SkippedCancelled,
                Readiness::Satisfied => {
                    let Some(task) = graph.task(name) else {
                        continue;
                    };
                    if task.is_group() {
                        debug!(task = %name, "grouping task complete");
                        RunState::Succeeded
                    } else {
                        match staleness::evaluate(task, self.probe) {
                            Staleness::UpToDate(reason) => {
                                info!(task = %name, ?reason, "up to date; skipping");
                                RunState::SkippedUpToDate
                            }
                            Staleness::Stale(reason) => {
                                debug!(task = %name, %reason, "stale; queued for execution");
                                RunState::Queued
                            }
                        }
                    }
                }
            };

            if next.is_terminal() {
                settled.push(name.to_string());
            }
            self.states.insert(name.to_string(), next);
        }

        settled
    }

    /// Move queued tasks to `Running`, in topological order, while fewer than
    /// `jobs` tasks are running.
    pub fn dispatch_queued(&mut self, jobs: usize, run_id: u64) -> Vec<ScheduledTask> {
        let graph = self.graph;
        let mut running = self.running_count();
        let mut scheduled = Vec::new();

        for name in graph.iter_topological() {
            if running >= jobs {
                break;
            }
            if self.states.get(name) != Some(&RunState::Queued) {
                continue;
            }
            if let Some(task) = graph.task(name) {
                info!(task = %name, run_id, "{}", task.title());
                self.states.insert(name.to_string(), RunState::Running);
                scheduled.push(ScheduledTask::new(task.clone(), run_id));
                running += 1;
            }
        }

        scheduled
    }

    /// Cancel every task that has not started yet.
    pub fn cancel_waiting(&mut self) -> Vec<TaskName> {
        let graph = self.graph;
        let mut cancelled = Vec::new();
        for name in graph.iter_topological() {
            if matches!(
                self.states.get(name),
                Some(RunState::Pending) | Some(RunState::Queued)
            ) {
                debug!(task = %name, "cancelled before start");
                self.states.insert(name.to_string(), RunState::SkippedCancelled);
                cancelled.push(name.to_string());
            }
        }
        cancelled
    }

    pub fn running_count(&self) -> usize {
        self.states
            .values()
            .filter(|s| matches!(s, RunState::Running))
            .count()
    }

    pub fn all_tasks_terminal(&self) -> bool {
        self.states.values().all(RunState::is_terminal)
    }
}
