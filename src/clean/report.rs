// src/clean/report.rs

use std::fmt;

use crate::task::TaskName;

/// What happened to one cleanup target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    Removed,
    AlreadyAbsent,
    RemovalError(String),
}

impl RemovalOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, RemovalOutcome::RemovalError(_))
    }
}

impl fmt::Display for RemovalOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalOutcome::Removed => write!(f, "removed"),
            RemovalOutcome::AlreadyAbsent => write!(f, "already absent"),
            RemovalOutcome::RemovalError(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// One cleanup target: an artifact path or a cleanup action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanEntry {
    pub target: String,
    pub outcome: RemovalOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCleanReport {
    pub task: TaskName,
    pub entries: Vec<CleanEntry>,
}

/// Result of a clean request, tasks in the order they were cleaned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub tasks: Vec<TaskCleanReport>,
}

impl CleanReport {
    pub fn task(&self, name: &str) -> Option<&TaskCleanReport> {
        self.tasks.iter().find(|t| t.task == name)
    }

    /// Names of the cleaned tasks, in cleaning order.
    pub fn task_names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.task.as_str()).collect()
    }

    /// Outcome for `target` of `task`, if it was part of the request.
    pub fn outcome(&self, task: &str, target: &str) -> Option<&RemovalOutcome> {
        self.task(task)?
            .entries
            .iter()
            .find(|e| e.target == target)
            .map(|e| &e.outcome)
    }

    pub fn errors(&self) -> impl Iterator<Item = (&str, &CleanEntry)> {
        self.tasks.iter().flat_map(|t| {
            t.entries
                .iter()
                .filter(|e| e.outcome.is_error())
                .map(move |e| (t.task.as_str(), e))
        })
    }

    pub fn is_success(&self) -> bool {
        self.errors().next().is_none()
    }
}

impl fmt::Display for CleanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for task in &self.tasks {
            if task.entries.is_empty() {
                writeln!(f, "{}: nothing to clean", task.task)?;
                continue;
            }
            writeln!(f, "{}:", task.task)?;
            for entry in &task.entries {
                writeln!(f, "  {} ({})", entry.target, entry.outcome)?;
            }
        }
        Ok(())
    }
}
