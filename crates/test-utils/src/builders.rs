#![allow(dead_code)]

use pipegraph::config::{
    ActionConfig, ArtifactConfig, ConfigSection, PipelineFile, RawPipelineFile, TaskConfig,
};
use pipegraph::errors::Result;
use pipegraph::task::{ArtifactKind, StalenessPolicy};

/// Builder for `PipelineFile` to simplify test setup.
pub struct PipelineFileBuilder {
    raw: RawPipelineFile,
}

impl PipelineFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawPipelineFile {
                config: ConfigSection::default(),
                task: Vec::new(),
            },
        }
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.raw.config.jobs = jobs;
        self
    }

    pub fn fail_fast(mut self, val: bool) -> Self {
        self.raw.config.fail_fast = val;
        self
    }

    pub fn with_task(mut self, task: TaskConfig) -> Self {
        self.raw.task.push(task);
        self
    }

    pub fn try_build(self) -> Result<PipelineFile> {
        PipelineFile::try_from(self.raw)
    }

    pub fn build(self) -> PipelineFile {
        self.try_build()
            .expect("Failed to build valid pipeline from builder")
    }
}

impl Default for PipelineFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `TaskConfig`.
pub struct TaskConfigBuilder {
    task: TaskConfig,
}

impl TaskConfigBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            task: TaskConfig {
                name: name.to_string(),
                title: None,
                actions: vec![],
                inputs: vec![],
                outputs: vec![],
                after: vec![],
                policy: None,
                clean: vec![],
            },
        }
    }

    pub fn cmd(mut self, argv: &[&str]) -> Self {
        self.task.actions.push(ActionConfig::Cmd {
            cmd: argv.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn shell(mut self, script: &str) -> Self {
        self.task.actions.push(ActionConfig::Shell {
            shell: script.to_string(),
        });
        self
    }

    pub fn input(mut self, path: &str) -> Self {
        self.task.inputs.push(ArtifactConfig::Path(path.into()));
        self
    }

    pub fn output(mut self, path: &str) -> Self {
        self.task.outputs.push(ArtifactConfig::Path(path.into()));
        self
    }

    pub fn output_dir(mut self, path: &str) -> Self {
        self.task.outputs.push(ArtifactConfig::Detailed {
            path: path.into(),
            kind: ArtifactKind::Directory,
        });
        self
    }

    pub fn after(mut self, dep: &str) -> Self {
        self.task.after.push(dep.to_string());
        self
    }

    pub fn run_once(mut self) -> Self {
        self.task.policy = Some(StalenessPolicy::RunOnce);
        self
    }

    pub fn build(self) -> TaskConfig {
        self.task
    }
}
