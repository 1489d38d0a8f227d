// src/config/validate.rs

use crate::config::model::{
    ActionConfig, ArtifactConfig, CleanConfig, CleanKeyword, ConfigSection, PipelineFile,
    RawPipelineFile, TaskConfig,
};
use crate::dag::TaskGraph;
use crate::errors::{PipegraphError, Result};
use crate::task::{Action, Artifact, CleanupAction, TaskDescriptor};

impl TryFrom<RawPipelineFile> for PipelineFile {
    type Error = PipegraphError;

    fn try_from(raw: RawPipelineFile) -> std::result::Result<Self, Self::Error> {
        ensure_has_tasks(&raw)?;
        validate_global_config(&raw.config)?;

        let descriptors = raw
            .task
            .iter()
            .map(descriptor_from_config)
            .collect::<Result<Vec<_>>>()?;
        let graph = TaskGraph::build(descriptors)?;

        Ok(PipelineFile::new_unchecked(raw.config, graph))
    }
}

fn ensure_has_tasks(raw: &RawPipelineFile) -> Result<()> {
    if raw.task.is_empty() {
        return Err(PipegraphError::ConfigError(
            "pipeline must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &ConfigSection) -> Result<()> {
    if cfg.jobs == 0 {
        return Err(PipegraphError::ConfigError(
            "[config].jobs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn descriptor_from_config(task: &TaskConfig) -> Result<TaskDescriptor> {
    let mut builder = TaskDescriptor::builder(task.name.clone())
        .inputs(task.inputs.iter().map(artifact_from_config))
        .outputs(task.outputs.iter().map(artifact_from_config))
        .task_deps(task.after.iter().cloned());

    if let Some(title) = &task.title {
        builder = builder.title(title.clone());
    }
    if let Some(policy) = task.policy {
        builder = builder.policy(policy);
    }

    for action in &task.actions {
        builder = builder.action(action_from_config(&task.name, action)?);
    }

    for step in &task.clean {
        let cleanup = match step {
            CleanConfig::Keyword(CleanKeyword::Targets) => CleanupAction::RemoveTargets,
            CleanConfig::Remove { remove } => CleanupAction::RemovePath(artifact_from_config(remove)),
            CleanConfig::Cmd { cmd } => CleanupAction::Run(action_from_config(
                &task.name,
                &ActionConfig::Cmd { cmd: cmd.clone() },
            )?),
            CleanConfig::Shell { shell } => CleanupAction::Run(Action::shell(shell.clone())),
        };
        builder = builder.cleanup(cleanup);
    }

    Ok(builder.build()?)
}

fn action_from_config(task: &str, action: &ActionConfig) -> Result<Action> {
    match action {
        ActionConfig::Cmd { cmd } => match cmd.split_first() {
            Some((program, args)) => Ok(Action::process(program.clone(), args.iter().cloned())),
            None => Err(PipegraphError::ConfigError(format!(
                "task '{task}' has an empty `cmd`"
            ))),
        },
        ActionConfig::Shell { shell } if shell.trim().is_empty() => Err(
            PipegraphError::ConfigError(format!("task '{task}' has an empty `shell`")),
        ),
        ActionConfig::Shell { shell } => Ok(Action::shell(shell.clone())),
    }
}

fn artifact_from_config(cfg: &ArtifactConfig) -> Artifact {
    match cfg {
        ArtifactConfig::Path(path) => Artifact::file(path.clone()),
        ArtifactConfig::Detailed { path, kind } => Artifact::new(path.clone(), *kind),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConstructionError;
    use crate::task::{ArtifactKind, StalenessPolicy};
    use crate::types::OutputMode;

    fn parse(src: &str) -> Result<PipelineFile> {
        let raw: RawPipelineFile = toml::from_str(src)?;
        PipelineFile::try_from(raw)
    }

    #[test]
    fn full_pipeline_parses() {
        let pipeline = parse(
            r#"
            [config]
            jobs = 2
            output = "stream"

            [[task]]
            name = "fetch"
            actions = [{ shell = "curl -s URL | gunzip -c > ref.fa" }]
            outputs = ["ref.fa"]
            policy = "run-once"

            [[task]]
            name = "index"
            actions = [{ cmd = ["build-index", "ref.fa", "ref"] }, { cmd = ["touch", "ref"] }]
            inputs = ["ref.fa"]
            outputs = ["ref", { path = "ref.d", kind = "directory" }]
            clean = ["targets", { remove = "ref.1.idx" }]

            [[task]]
            name = "all"
            after = ["index"]
            "#,
        )
        .unwrap();

        assert_eq!(pipeline.config.jobs, 2);
        assert_eq!(pipeline.config.output, OutputMode::Stream);
        assert!(!pipeline.config.fail_fast);

        let graph = &pipeline.graph;
        assert_eq!(graph.topological_order(), vec!["fetch", "index", "all"]);

        let fetch = graph.task("fetch").unwrap();
        assert_eq!(fetch.policy(), StalenessPolicy::RunOnce);

        let index = graph.task("index").unwrap();
        assert_eq!(index.actions().len(), 2);
        assert_eq!(index.outputs()[1].kind(), ArtifactKind::Directory);
        assert_eq!(index.cleanup().len(), 2);
        assert_eq!(graph.predecessors_of("index"), vec!["fetch"]);

        assert!(graph.task("all").unwrap().is_group());
    }

    #[test]
    fn empty_pipeline_is_rejected() {
        let err = parse("[config]\njobs = 1\n").unwrap_err();
        assert!(matches!(err, PipegraphError::ConfigError(_)));
    }

    #[test]
    fn zero_jobs_is_rejected() {
        let err = parse(
            r#"
            [config]
            jobs = 0

            [[task]]
            name = "a"
            actions = [{ cmd = ["true"] }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, PipegraphError::ConfigError(msg) if msg.contains("jobs")));
    }

    #[test]
    fn empty_cmd_is_rejected() {
        let err = parse(
            r#"
            [[task]]
            name = "a"
            actions = [{ cmd = [] }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, PipegraphError::ConfigError(msg) if msg.contains("empty `cmd`")));
    }

    #[test]
    fn unknown_after_is_a_construction_error() {
        let err = parse(
            r#"
            [[task]]
            name = "a"
            after = ["ghost"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipegraphError::Construction(ConstructionError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn cycle_is_reported_with_path() {
        let err = parse(
            r#"
            [[task]]
            name = "a"
            actions = [{ cmd = ["true"] }]
            after = ["b"]

            [[task]]
            name = "b"
            actions = [{ cmd = ["true"] }]
            after = ["a"]
            "#,
        )
        .unwrap_err();
        match err {
            PipegraphError::Construction(e) => {
                let cycle = e.cycle().unwrap();
                assert_eq!(cycle.first(), cycle.last());
                assert_eq!(cycle.len(), 3);
            }
            other => panic!("expected construction error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_task_field_is_a_toml_error() {
        let err = parse(
            r#"
            [[task]]
            name = "a"
            acitons = [{ cmd = ["true"] }]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, PipegraphError::TomlError(_)));
    }
}
