// src/errors.rs

//! Crate-wide error types and aliases.

use thiserror::Error;

use crate::task::{StalenessPolicy, TaskName};

/// Problems detected while assembling task descriptors into a graph.
///
/// All of these are fatal and surface before anything executes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("task name must not be empty")]
    EmptyName,

    #[error("duplicate task name: {0}")]
    DuplicateTask(TaskName),

    #[error("artifact '{artifact}' is produced by both '{first}' and '{second}'")]
    DuplicateProducer {
        artifact: String,
        first: TaskName,
        second: TaskName,
    },

    #[error("task '{task}' has unknown dependency '{dependency}'")]
    UnknownDependency { task: TaskName, dependency: TaskName },

    #[error("task '{0}' cannot depend on itself")]
    SelfDependency(TaskName),

    #[error("cycle detected in task graph: {}", .0.join(" -> "))]
    Cycle(Vec<TaskName>),

    #[error("run-once task '{0}' must declare at least one output")]
    RunOnceWithoutOutputs(TaskName),

    #[error("grouping task '{0}' cannot declare actions")]
    GroupWithActions(TaskName),

    #[error("grouping task '{0}' cannot declare outputs")]
    GroupWithOutputs(TaskName),

    #[error("grouping task '{0}' cannot use the {1:?} staleness policy")]
    GroupWithPolicy(TaskName, StalenessPolicy),
}

impl ConstructionError {
    /// Task names in the offending cycle, if this is a cycle error.
    pub fn cycle(&self) -> Option<&[TaskName]> {
        match self {
            ConstructionError::Cycle(names) => Some(names),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum PipegraphError {
    #[error("Construction error: {0}")]
    Construction(#[from] ConstructionError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipegraphError>;
