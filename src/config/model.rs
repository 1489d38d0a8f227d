// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::dag::TaskGraph;
use crate::task::{ArtifactKind, StalenessPolicy};
use crate::types::{OutputMode, RunOptions};

/// Top-level pipeline file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// jobs = 2
///
/// [[task]]
/// name = "trim"
/// actions = [{ cmd = ["trim-reads", "reads.fq", "trimmed.fq"] }]
/// inputs = ["reads.fq"]
/// outputs = ["trimmed.fq"]
///
/// [[task]]
/// name = "all"
/// after = ["trim"]
/// ```
///
/// `[[task]]` is an array so declaration order is preserved; it breaks ties
/// in the execution order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPipelineFile {
    /// Engine options from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All tasks from `[[task]]`, in declaration order.
    #[serde(default)]
    pub task: Vec<TaskConfig>,
}

/// `[config]` section. Every field can be overridden from the CLI.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Maximum number of tasks running at once.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Cancel tasks that have not started after the first failure.
    #[serde(default)]
    pub fail_fast: bool,

    /// `"capture"` (default) or `"stream"`.
    #[serde(default)]
    pub output: OutputMode,
}

fn default_jobs() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            fail_fast: false,
            output: OutputMode::default(),
        }
    }
}

/// One `[[task]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskConfig {
    pub name: String,

    /// Display title; defaults to the name plus the rendered actions.
    #[serde(default)]
    pub title: Option<String>,

    /// Actions run in order. A task without actions is a grouping task.
    #[serde(default)]
    pub actions: Vec<ActionConfig>,

    /// Artifacts read by the task (`file_dep`).
    #[serde(default)]
    pub inputs: Vec<ArtifactConfig>,

    /// Artifacts produced by the task (`targets`).
    #[serde(default)]
    pub outputs: Vec<ArtifactConfig>,

    /// Explicit task dependencies.
    #[serde(default)]
    pub after: Vec<String>,

    /// `"timestamp"` (default), `"run-once"` or `"never"`.
    #[serde(default)]
    pub policy: Option<StalenessPolicy>,

    /// Cleanup steps; empty means "remove the outputs".
    #[serde(default)]
    pub clean: Vec<CleanConfig>,
}

/// `{ cmd = ["prog", "arg"] }` or `{ shell = "a | b > c" }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ActionConfig {
    Cmd { cmd: Vec<String> },
    Shell { shell: String },
}

/// `"path"` (a file) or `{ path = "dir", kind = "directory" }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ArtifactConfig {
    Path(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default)]
        kind: ArtifactKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CleanKeyword {
    /// Remove every declared output.
    Targets,
}

/// One cleanup step: `"targets"`, `{ remove = ... }`, `{ cmd = [...] }` or
/// `{ shell = "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CleanConfig {
    Keyword(CleanKeyword),
    Remove { remove: ArtifactConfig },
    Cmd { cmd: Vec<String> },
    Shell { shell: String },
}

/// Validated pipeline: engine options plus the task graph.
///
/// Only constructed through `TryFrom<RawPipelineFile>`.
#[derive(Debug)]
pub struct PipelineFile {
    pub config: ConfigSection,
    pub graph: TaskGraph,
}

impl PipelineFile {
    pub(crate) fn new_unchecked(config: ConfigSection, graph: TaskGraph) -> Self {
        Self { config, graph }
    }

    /// Run options from `[config]`, targeting every task.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            jobs: self.config.jobs,
            fail_fast: self.config.fail_fast,
            output: self.config.output,
            targets: Vec::new(),
        }
    }
}
