// src/task/descriptor.rs

//! Immutable task records and the builder that validates them.

use std::fmt;

use serde::Deserialize;

use crate::errors::ConstructionError;
use crate::task::{Action, Artifact, TaskName};

/// When a task counts as up to date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StalenessPolicy {
    /// Run when an output is missing or older than the newest input.
    #[default]
    Timestamp,
    /// Up to date forever once every output exists (one-shot downloads).
    RunOnce,
    /// Never runs anything itself; only sequences its dependencies.
    Never,
}

/// One step of an explicit clean request.
#[derive(Debug, Clone)]
pub enum CleanupAction {
    /// Remove every declared output of the task.
    RemoveTargets,
    /// Remove a specific path; directories are removed recursively.
    RemovePath(Artifact),
    /// Run an arbitrary action.
    Run(Action),
}

impl fmt::Display for CleanupAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CleanupAction::RemoveTargets => write!(f, "remove targets"),
            CleanupAction::RemovePath(a) => write!(f, "remove {a}"),
            CleanupAction::Run(action) => write!(f, "{action}"),
        }
    }
}

/// A declarative unit of work. Built once through [`TaskBuilder`], never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    name: TaskName,
    title: Option<String>,
    actions: Vec<Action>,
    inputs: Vec<Artifact>,
    outputs: Vec<Artifact>,
    task_deps: Vec<TaskName>,
    policy: StalenessPolicy,
    cleanup: Vec<CleanupAction>,
}

impl TaskDescriptor {
    pub fn builder(name: impl Into<TaskName>) -> TaskBuilder {
        TaskBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display title: the explicit title if one was given, otherwise the
    /// name followed by the actions (or the grouped tasks).
    pub fn title(&self) -> String {
        if let Some(title) = &self.title {
            return title.clone();
        }
        if self.is_group() {
            format!("{} => Group: {}", self.name, self.task_deps.join(", "))
        } else {
            let actions = self
                .actions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} => {}", self.name, actions)
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn inputs(&self) -> &[Artifact] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Artifact] {
        &self.outputs
    }

    pub fn task_deps(&self) -> &[TaskName] {
        &self.task_deps
    }

    pub fn policy(&self) -> StalenessPolicy {
        self.policy
    }

    pub fn cleanup(&self) -> &[CleanupAction] {
        &self.cleanup
    }

    /// A grouping task has no actions and only sequences its dependencies.
    pub fn is_group(&self) -> bool {
        self.actions.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TaskBuilder {
    name: TaskName,
    title: Option<String>,
    actions: Vec<Action>,
    inputs: Vec<Artifact>,
    outputs: Vec<Artifact>,
    task_deps: Vec<TaskName>,
    policy: Option<StalenessPolicy>,
    cleanup: Vec<CleanupAction>,
}

impl TaskBuilder {
    pub fn new(name: impl Into<TaskName>) -> Self {
        Self {
            name: name.into(),
            title: None,
            actions: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            task_deps: Vec::new(),
            policy: None,
            cleanup: Vec::new(),
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn action(mut self, action: impl Into<Action>) -> Self {
        self.actions.push(action.into());
        self
    }

    pub fn actions<I>(mut self, actions: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Action>,
    {
        self.actions.extend(actions.into_iter().map(Into::into));
        self
    }

    pub fn input(mut self, artifact: impl Into<Artifact>) -> Self {
        push_unique(&mut self.inputs, artifact.into());
        self
    }

    pub fn inputs<I>(mut self, artifacts: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Artifact>,
    {
        for a in artifacts {
            push_unique(&mut self.inputs, a.into());
        }
        self
    }

    pub fn output(mut self, artifact: impl Into<Artifact>) -> Self {
        push_unique(&mut self.outputs, artifact.into());
        self
    }

    pub fn outputs<I>(mut self, artifacts: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Artifact>,
    {
        for a in artifacts {
            push_unique(&mut self.outputs, a.into());
        }
        self
    }

    pub fn task_dep(mut self, name: impl Into<TaskName>) -> Self {
        push_unique(&mut self.task_deps, name.into());
        self
    }

    pub fn task_deps<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        for n in names {
            push_unique(&mut self.task_deps, n.into());
        }
        self
    }

    pub fn policy(mut self, policy: StalenessPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn run_once(self) -> Self {
        self.policy(StalenessPolicy::RunOnce)
    }

    pub fn cleanup(mut self, action: CleanupAction) -> Self {
        self.cleanup.push(action);
        self
    }

    pub fn build(self) -> Result<TaskDescriptor, ConstructionError> {
        if self.name.trim().is_empty() {
            return Err(ConstructionError::EmptyName);
        }
        let policy = if self.actions.is_empty() {
            // A task without actions is a group and only orders its dependencies.
            if !self.outputs.is_empty() {
                return Err(ConstructionError::GroupWithOutputs(self.name));
            }
            match self.policy {
                None | Some(StalenessPolicy::Never) => StalenessPolicy::Never,
                Some(other) => return Err(ConstructionError::GroupWithPolicy(self.name, other)),
            }
        } else {
            match self.policy {
                Some(StalenessPolicy::Never) => {
                    return Err(ConstructionError::GroupWithActions(self.name));
                }
                explicit => explicit.unwrap_or(StalenessPolicy::Timestamp),
            }
        };
        if policy == StalenessPolicy::RunOnce && self.outputs.is_empty() {
            return Err(ConstructionError::RunOnceWithoutOutputs(self.name));
        }

        Ok(TaskDescriptor {
            name: self.name,
            title: self.title,
            actions: self.actions,
            inputs: self.inputs,
            outputs: self.outputs,
            task_deps: self.task_deps,
            policy,
            cleanup: self.cleanup,
        })
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}
