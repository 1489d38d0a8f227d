use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::StateManager;
use crate::dag::task_info::RunState;
use crate::engine::{RunReport, TaskName, TaskOutcome, TaskReport};
use crate::errors::{PipegraphError, Result};
use crate::fs::{ArtifactProbe, FileSystem};

/// Scheduler holds the immutable task graph plus mutable per-run state.
///
/// It is responsible for:
/// - remembering which tasks are part of the current run
/// - deciding, once a task's predecessors are done, whether it is stale
/// - handing stale tasks to the executor without exceeding `jobs`
/// - marking tasks as succeeded/failed and blocking their dependents
/// - cancelling tasks that have not started yet
///
/// Per-run state is discarded by the next [`Scheduler::start_run`]; nothing
/// survives between runs except the artifacts on disk.
#[derive(Debug)]
pub struct Scheduler {
    graph: Arc<TaskGraph>,
    probe: ArtifactProbe,
    jobs: usize,
    states: HashMap<TaskName, RunState>,
    /// Tasks whose actions were executed in the current run.
    executed: HashSet<TaskName>,
    /// Monotonically increasing run ID.
    run_counter: u64,
    /// Currently active run ID, or `None` if there is no active run.
    current_run_id: Option<u64>,
    cancelled: bool,
}

impl Scheduler {
    pub fn new(graph: Arc<TaskGraph>, fs: Arc<dyn FileSystem>, jobs: usize) -> Self {
        Self {
            graph,
            probe: ArtifactProbe::new(fs),
            jobs: jobs.max(1),
            states: HashMap::new(),
            executed: HashSet::new(),
            run_counter: 0,
            current_run_id: None,
            cancelled: false,
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        self.current_run_id.is_none()
    }

    pub fn current_run_id(&self) -> Option<u64> {
        self.current_run_id
    }

    /// State of `task` in the current (or last finished) run.
    pub fn state_of(&self, task: &str) -> Option<&RunState> {
        self.states.get(task)
    }

    /// Names of tasks participating in the current (or last finished) run.
    pub fn tasks_in_run(&self) -> Vec<TaskName> {
        self.graph
            .iter_topological()
            .filter(|name| self.states.contains_key(*name))
            .map(str::to_string)
            .collect()
    }

    /// Start a new run over `targets` and everything they depend on, or over
    /// the whole graph when `targets` is empty.
    pub fn start_run(&mut self, targets: &[TaskName]) -> Result<SchedulerStep> {
        if let Some(unknown) = targets.iter().find(|t| !self.graph.contains(t)) {
            return Err(PipegraphError::TaskNotFound(unknown.clone()));
        }

        let participants: HashSet<TaskName> = if targets.is_empty() {
            self.graph.iter_topological().map(str::to_string).collect()
        } else {
            self.graph
                .with_predecessors(targets.iter().map(String::as_str))
        };

        self.run_counter += 1;
        self.current_run_id = Some(self.run_counter);
        self.cancelled = false;
        self.executed.clear();

        let mut manager = StateManager::new(&self.graph, &mut self.states, &self.probe);
        manager.mark_pending(&participants);

        info!(
            run_id = self.run_counter,
            tasks = participants.len(),
            jobs = self.jobs,
            "scheduler: starting new run"
        );

        Ok(self.advance())
    }

    /// Record the outcome of a running task and schedule what it unblocked.
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        if !self.record_completion(task, outcome) {
            return SchedulerStep::default();
        }
        self.advance()
    }

    /// Record the outcome of a running task, then cancel the rest of the run.
    ///
    /// Dependents of a failed task settle as `SkippedBlocked`; only tasks
    /// that could still have run become `SkippedCancelled`.
    pub fn step_completion_and_cancel(
        &mut self,
        task: &str,
        outcome: TaskOutcome,
    ) -> SchedulerStep {
        if !self.record_completion(task, outcome) {
            return SchedulerStep::default();
        }
        self.cancelled = true;
        let step = self.advance();
        info!(settled = step.newly_settled.len(), "scheduler: run cancelled");
        step
    }

    fn record_completion(&mut self, task: &str, outcome: TaskOutcome) -> bool {
        let Some(run_id) = self.current_run_id else {
            warn!(task = %task, "completion with no active run; ignoring");
            return false;
        };

        match self.states.get(task) {
            Some(RunState::Running) => {}
            other => {
                warn!(task = %task, state = ?other, "completion for task that is not running; ignoring");
                return false;
            }
        }

        let next = match outcome {
            TaskOutcome::Success => {
                debug!(task = %task, run_id, "task completed successfully");
                RunState::Succeeded
            }
            TaskOutcome::Failed(failure) => {
                warn!(
                    task = %task,
                    run_id,
                    action_index = failure.action_index,
                    exit_code = ?failure.exit_code,
                    error = %failure.message,
                    "task failed; blocking dependents"
                );
                RunState::Failed(failure)
            }
        };
        self.states.insert(task.to_string(), next);
        true
    }

    /// Stop starting tasks. Running tasks are left to finish; everything
    /// still waiting becomes `SkippedCancelled`.
    pub fn cancel(&mut self) -> SchedulerStep {
        if self.current_run_id.is_none() {
            return SchedulerStep::default();
        }
        self.cancelled = true;

        let mut manager = StateManager::new(&self.graph, &mut self.states, &self.probe);
        let newly_settled = manager.cancel_waiting();
        info!(cancelled = newly_settled.len(), "scheduler: run cancelled");

        let run_just_finished = self.maybe_finish_run();
        SchedulerStep {
            newly_scheduled: Vec::new(),
            newly_settled,
            run_just_finished,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Report for the current (or last finished) run, in topological order.
    pub fn report(&self) -> RunReport {
        let tasks = self
            .graph
            .iter_topological()
            .filter_map(|name| {
                let status = self.states.get(name)?.status()?;
                let ran = self.executed.contains(name);
                Some(TaskReport {
                    name: name.to_string(),
                    status,
                    ran,
                })
            })
            .collect();

        RunReport {
            run_id: self.run_counter,
            tasks,
        }
    }

    /// Settle what can be settled, dispatch what fits, detect the end of the run.
    fn advance(&mut self) -> SchedulerStep {
        let run_id = self.current_run_id.unwrap_or(self.run_counter);
        let mut manager = StateManager::new(&self.graph, &mut self.states, &self.probe);

        let mut newly_settled = manager.resolve_pending();
        let newly_scheduled = if self.cancelled {
            newly_settled.extend(manager.cancel_waiting());
            Vec::new()
        } else {
            manager.dispatch_queued(self.jobs, run_id)
        };

        for t in &newly_scheduled {
            self.executed.insert(t.name.clone());
        }

        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            newly_settled,
            run_just_finished,
        }
    }

    /// Clear `current_run_id` once every participating task is terminal.
    fn maybe_finish_run(&mut self) -> bool {
        if self.current_run_id.is_none() {
            return false;
        }

        let manager = StateManager::new(&self.graph, &mut self.states, &self.probe);
        if manager.all_tasks_terminal() {
            info!(
                run_id = self.current_run_id,
                "scheduler: all tasks terminal; marking run as finished"
            );
            self.current_run_id = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ActionFailure, TaskStatus};
    use crate::fs::mock::{MockFileSystem, at};
    use crate::task::{Action, TaskDescriptor};

    fn step(name: &str) -> crate::task::TaskBuilder {
        TaskDescriptor::builder(name).action(Action::process("echo", [name.to_string()]))
    }

    fn failure() -> TaskOutcome {
        TaskOutcome::Failed(ActionFailure {
            action_index: 0,
            exit_code: Some(1),
            message: "boom".into(),
        })
    }

    fn scheduler(tasks: Vec<TaskDescriptor>, fs: &MockFileSystem, jobs: usize) -> Scheduler {
        let graph = Arc::new(TaskGraph::build(tasks).unwrap());
        Scheduler::new(graph, Arc::new(fs.clone()), jobs)
    }

    #[test]
    fn chain_runs_in_order() {
        let fs = MockFileSystem::new();
        let mut s = scheduler(
            vec![
                step("a").output("x.txt").build().unwrap(),
                step("b").input("x.txt").output("y.txt").build().unwrap(),
            ],
            &fs,
            4,
        );

        let first = s.start_run(&[]).unwrap();
        assert_eq!(first.scheduled_names(), vec!["a"]);

        fs.add_file("x.txt", at(1));
        let second = s.step_completion("a", TaskOutcome::Success);
        assert_eq!(second.scheduled_names(), vec!["b"]);

        fs.add_file("y.txt", at(2));
        let third = s.step_completion("b", TaskOutcome::Success);
        assert!(third.run_just_finished);
        assert!(s.is_idle());
        assert_eq!(s.report().ran(), vec!["a", "b"]);
    }

    #[test]
    fn up_to_date_tasks_are_skipped_without_dispatch() {
        let fs = MockFileSystem::new();
        fs.add_file("x.txt", at(1));
        fs.add_file("y.txt", at(2));
        let mut s = scheduler(
            vec![
                step("a").output("x.txt").build().unwrap(),
                step("b").input("x.txt").output("y.txt").build().unwrap(),
            ],
            &fs,
            1,
        );

        let first = s.start_run(&[]).unwrap();
        assert!(first.newly_scheduled.is_empty());
        assert_eq!(first.newly_settled, vec!["a", "b"]);
        assert!(first.run_just_finished);
        assert_eq!(s.report().status_of("b"), Some(&TaskStatus::SkippedUpToDate));
    }

    #[test]
    fn failure_blocks_dependents_but_not_siblings() {
        let fs = MockFileSystem::new();
        let mut s = scheduler(
            vec![
                step("x").output("x.out").build().unwrap(),
                step("y").output("y.out").build().unwrap(),
                step("z").input("x.out").output("z.out").build().unwrap(),
            ],
            &fs,
            2,
        );

        let first = s.start_run(&[]).unwrap();
        assert_eq!(first.scheduled_names(), vec!["x", "y"]);

        let after_x = s.step_completion("x", failure());
        assert_eq!(after_x.newly_settled, vec!["z"]);
        assert!(!after_x.run_just_finished);

        let after_y = s.step_completion("y", TaskOutcome::Success);
        assert!(after_y.run_just_finished);

        let report = s.report();
        assert!(matches!(report.status_of("x"), Some(TaskStatus::Failed(_))));
        assert_eq!(report.status_of("y"), Some(&TaskStatus::Succeeded));
        assert_eq!(report.status_of("z"), Some(&TaskStatus::SkippedBlocked));
        assert_eq!(report.ran(), vec!["x", "y"]);
    }

    #[test]
    fn jobs_limit_caps_running_tasks() {
        let fs = MockFileSystem::new();
        let mut s = scheduler(
            vec![
                step("a").build().unwrap(),
                step("b").build().unwrap(),
                step("c").build().unwrap(),
            ],
            &fs,
            2,
        );

        let first = s.start_run(&[]).unwrap();
        assert_eq!(first.scheduled_names(), vec!["a", "b"]);
        assert_eq!(s.state_of("c"), Some(&RunState::Queued));

        let next = s.step_completion("b", TaskOutcome::Success);
        assert_eq!(next.scheduled_names(), vec!["c"]);
    }

    #[test]
    fn group_succeeds_without_running() {
        let fs = MockFileSystem::new();
        let mut s = scheduler(
            vec![
                step("a").build().unwrap(),
                step("b").build().unwrap(),
                TaskDescriptor::builder("all").task_deps(["a", "b"]).build().unwrap(),
            ],
            &fs,
            2,
        );

        s.start_run(&[]).unwrap();
        s.step_completion("a", TaskOutcome::Success);
        assert_eq!(s.state_of("all"), Some(&RunState::Pending));

        let last = s.step_completion("b", TaskOutcome::Success);
        assert_eq!(last.newly_settled, vec!["all"]);
        assert!(last.newly_scheduled.is_empty());

        let report = s.report();
        assert_eq!(report.status_of("all"), Some(&TaskStatus::Succeeded));
        assert!(!report.ran().contains(&"all"));
    }

    #[test]
    fn cancel_skips_waiting_tasks_and_lets_running_finish() {
        let fs = MockFileSystem::new();
        let mut s = scheduler(
            vec![
                step("a").output("a.out").build().unwrap(),
                step("b").input("a.out").build().unwrap(),
                step("c").build().unwrap(),
            ],
            &fs,
            1,
        );

        s.start_run(&[]).unwrap();
        let cancel = s.cancel();
        assert_eq!(cancel.newly_settled, vec!["b", "c"]);
        assert!(!cancel.run_just_finished);

        let done = s.step_completion("a", TaskOutcome::Success);
        assert!(done.newly_scheduled.is_empty());
        assert!(done.run_just_finished);

        let report = s.report();
        assert_eq!(report.status_of("a"), Some(&TaskStatus::Succeeded));
        assert_eq!(report.status_of("b"), Some(&TaskStatus::SkippedCancelled));
        assert_eq!(report.status_of("c"), Some(&TaskStatus::SkippedCancelled));
    }

    #[test]
    fn targets_pull_in_predecessors_only() {
        let fs = MockFileSystem::new();
        let mut s = scheduler(
            vec![
                step("a").output("a.out").build().unwrap(),
                step("b").input("a.out").build().unwrap(),
                step("unrelated").build().unwrap(),
            ],
            &fs,
            4,
        );

        s.start_run(&["b".to_string()]).unwrap();
        assert_eq!(s.tasks_in_run(), vec!["a", "b"]);
        assert_eq!(s.state_of("unrelated"), None);

        let err = s.start_run(&["nope".to_string()]).unwrap_err();
        assert!(matches!(err, PipegraphError::TaskNotFound(name) if name == "nope"));
    }

    #[test]
    fn completion_for_unknown_or_idle_task_is_ignored() {
        let fs = MockFileSystem::new();
        let mut s = scheduler(vec![step("a").build().unwrap()], &fs, 1);
        let step = s.step_completion("a", TaskOutcome::Success);
        assert!(step.newly_scheduled.is_empty());
        assert!(!step.run_just_finished);
    }
}
