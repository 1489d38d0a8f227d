// src/dag/staleness.rs

//! Staleness evaluation for a single task.
//!
//! The unit of staleness is the whole task: the newest input is compared
//! against the oldest output, the same rule a classic file-based build tool
//! applies per target.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::fs::ArtifactProbe;
use crate::task::{StalenessPolicy, TaskDescriptor};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaleReason {
    /// Nothing can prove a task without outputs up to date.
    NoOutputs,
    MissingOutput(PathBuf),
    /// A declared input is absent; the task runs so its action reports the
    /// actual problem.
    MissingInput(PathBuf),
    InputNewer { input: PathBuf, output: PathBuf },
}

impl fmt::Display for StaleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaleReason::NoOutputs => write!(f, "task declares no outputs"),
            StaleReason::MissingOutput(p) => write!(f, "output {} is missing", p.display()),
            StaleReason::MissingInput(p) => write!(f, "input {} is missing", p.display()),
            StaleReason::InputNewer { input, output } => write!(
                f,
                "input {} is newer than output {}",
                input.display(),
                output.display()
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpToDateReason {
    RunOnce,
    OutputsCurrent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    Stale(StaleReason),
    UpToDate(UpToDateReason),
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Staleness::Stale(_))
    }
}

/// Decide whether `task` has to run, based only on what is on disk now.
pub fn evaluate(task: &TaskDescriptor, probe: &ArtifactProbe) -> Staleness {
    let outputs = task.outputs();

    if task.policy() == StalenessPolicy::RunOnce
        && !outputs.is_empty()
        && outputs.iter().all(|o| probe.exists(o))
    {
        return Staleness::UpToDate(UpToDateReason::RunOnce);
    }

    if outputs.is_empty() {
        return Staleness::Stale(StaleReason::NoOutputs);
    }

    let mut oldest_output: Option<(SystemTime, &Path)> = None;
    for output in outputs {
        let Some(mtime) = probe.modified_time(output) else {
            return Staleness::Stale(StaleReason::MissingOutput(output.path().to_path_buf()));
        };
        if oldest_output.is_none_or(|(t, _)| mtime < t) {
            oldest_output = Some((mtime, output.path()));
        }
    }

    let mut newest_input: Option<(SystemTime, &Path)> = None;
    for input in task.inputs() {
        let Some(mtime) = probe.modified_time(input) else {
            return Staleness::Stale(StaleReason::MissingInput(input.path().to_path_buf()));
        };
        if newest_input.is_none_or(|(t, _)| mtime > t) {
            newest_input = Some((mtime, input.path()));
        }
    }

    match (newest_input, oldest_output) {
        (Some((input_time, input)), Some((output_time, output))) if input_time > output_time => {
            Staleness::Stale(StaleReason::InputNewer {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
            })
        }
        _ => Staleness::UpToDate(UpToDateReason::OutputsCurrent),
    }
}
