// src/task/recipes.rs

//! Constructors for recurring pipeline-stage shapes.
//!
//! None of these know any particular tool's command syntax; callers supply
//! the tool invocations and the recipes wire up names, artifacts, staleness
//! policy and cleanup the same way every time.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use minijinja::Environment;
use serde::Serialize;

use crate::errors::ConstructionError;
use crate::task::{Action, Artifact, CleanupAction, TaskDescriptor, TaskName};

type Built = Result<TaskDescriptor, ConstructionError>;

/// Create `folder` (and its parents) once.
pub fn create_folder_task(folder: impl Into<PathBuf>, label: Option<&str>) -> Built {
    let folder = folder.into();
    let name = match label {
        Some(label) => label.to_string(),
        None => format!("create_folder_{}", folder.display()),
    };

    let target = folder.clone();
    TaskDescriptor::builder(name)
        .action(Action::in_process(
            format!("create_dir_all({})", folder.display()),
            move || {
                fs::create_dir_all(&target)
                    .with_context(|| format!("creating {}", target.display()))
            },
        ))
        .output(Artifact::dir(folder))
        .run_once()
        .cleanup(CleanupAction::RemoveTargets)
        .build()
}

/// Symlink `src` into the working directory under its base name.
pub fn link_file_task(src: impl AsRef<Path>) -> Built {
    let src = src.as_ref();
    let base = base_name(src);

    TaskDescriptor::builder(format!("ln_{base}"))
        .action(Action::process(
            "ln",
            ["-fs".to_string(), src.display().to_string()],
        ))
        .output(base)
        .run_once()
        .cleanup(CleanupAction::RemoveTargets)
        .build()
}

/// One-shot fetch into `target_dir`, recorded by a `<name>.done` sentinel.
///
/// `fetch` runs in order; the sentinel is only written once all of it
/// succeeded, so an interrupted fetch is retried on the next run. Cleaning
/// removes the directory and the sentinel.
pub fn download_task(
    name: impl Into<TaskName>,
    fetch: Vec<Action>,
    target_dir: impl Into<PathBuf>,
) -> Built {
    let name = name.into();
    let target_dir = target_dir.into();
    let sentinel = PathBuf::from(format!("{name}.done"));

    let marker = sentinel.clone();
    TaskDescriptor::builder(name)
        .actions(fetch)
        .action(Action::in_process(
            format!("touch {}", sentinel.display()),
            move || {
                File::create(&marker)
                    .map(drop)
                    .with_context(|| format!("writing sentinel {}", marker.display()))
            },
        ))
        .output(Artifact::sentinel(&sentinel))
        .run_once()
        .cleanup(CleanupAction::RemovePath(Artifact::dir(target_dir)))
        .cleanup(CleanupAction::RemovePath(Artifact::sentinel(sentinel)))
        .build()
}

/// Concatenate `inputs`, in order, into `target`.
pub fn concat_task(inputs: Vec<PathBuf>, target: impl Into<PathBuf>) -> Built {
    let target = target.into();
    let name = format!("cat_{}", target.display());

    let sources = inputs.clone();
    let dest = target.clone();
    TaskDescriptor::builder(name)
        .action(Action::in_process(
            format!("concat -> {}", target.display()),
            move || concat_files(&sources, &dest),
        ))
        .inputs(inputs)
        .output(target)
        .cleanup(CleanupAction::RemoveTargets)
        .build()
}

fn concat_files(sources: &[PathBuf], dest: &Path) -> anyhow::Result<()> {
    let mut out = File::create(dest).with_context(|| format!("creating {}", dest.display()))?;
    for src in sources {
        let mut input = File::open(src).with_context(|| format!("opening {}", src.display()))?;
        io::copy(&mut input, &mut out)
            .with_context(|| format!("appending {} to {}", src.display(), dest.display()))?;
    }
    out.flush()?;
    Ok(())
}

/// A task that only sequences `deps`.
pub fn group_task<I, S>(name: impl Into<TaskName>, deps: I) -> Built
where
    I: IntoIterator<Item = S>,
    S: Into<TaskName>,
{
    TaskDescriptor::builder(name).task_deps(deps).build()
}

/// Settings for [`render_script_task`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptConfig {
    /// Template file (minijinja syntax).
    pub template: PathBuf,
    /// Script written by the task.
    pub script: PathBuf,
    /// Files the script operates on; exposed to the template as `inputs`.
    pub inputs: Vec<PathBuf>,
    /// Extra template variables (resources, queue names, ...).
    pub vars: BTreeMap<String, String>,
    /// Task name; defaults to `render_<script>`.
    pub label: Option<String>,
}

impl ScriptConfig {
    pub fn new(template: impl Into<PathBuf>, script: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            script: script.into(),
            inputs: Vec::new(),
            vars: BTreeMap::new(),
            label: None,
        }
    }

    pub fn input(mut self, path: impl Into<PathBuf>) -> Self {
        self.inputs.push(path.into());
        self
    }

    pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Serialize)]
struct ScriptContext<'a> {
    inputs: Vec<String>,
    #[serde(flatten)]
    vars: &'a BTreeMap<String, String>,
}

/// Write a batch script rendered from a template, for later manual
/// submission. The template and the inputs are both dependencies, so
/// editing either re-renders the script.
pub fn render_script_task(cfg: ScriptConfig) -> Built {
    let name = cfg
        .label
        .clone()
        .unwrap_or_else(|| format!("render_{}", cfg.script.display()));

    let inputs = cfg.inputs.clone();
    let template = cfg.template.clone();
    let script = cfg.script.clone();
    let label = format!("render {} -> {}", cfg.template.display(), cfg.script.display());

    TaskDescriptor::builder(name)
        .action(Action::in_process(label, move || render_script(&cfg)))
        .inputs(inputs)
        .input(template)
        .output(script)
        .cleanup(CleanupAction::RemoveTargets)
        .build()
}

fn render_script(cfg: &ScriptConfig) -> anyhow::Result<()> {
    let source = fs::read_to_string(&cfg.template)
        .with_context(|| format!("reading template {}", cfg.template.display()))?;

    let ctx = ScriptContext {
        inputs: cfg.inputs.iter().map(|p| p.display().to_string()).collect(),
        vars: &cfg.vars,
    };

    let mut env = Environment::new();
    env.set_keep_trailing_newline(true);
    let rendered = env
        .render_str(&source, ctx)
        .with_context(|| format!("rendering {}", cfg.template.display()))?;

    fs::write(&cfg.script, rendered)
        .with_context(|| format!("writing {}", cfg.script.display()))?;
    Ok(())
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
