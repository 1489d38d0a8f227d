// tests/config_loading.rs

use std::error::Error;
use std::fs;

use pipegraph::config::load_and_validate;
use pipegraph::errors::{ConstructionError, PipegraphError};
use pipegraph_test_utils::builders::{PipelineFileBuilder, TaskConfigBuilder};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn loads_pipeline_from_disk() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("Pipegraph.toml");
    fs::write(
        &path,
        r#"
        [config]
        jobs = 3
        fail_fast = true

        [[task]]
        name = "trim"
        actions = [{ cmd = ["trim-reads", "reads.fq", "trimmed.fq"] }]
        inputs = ["reads.fq"]
        outputs = ["trimmed.fq"]

        [[task]]
        name = "count"
        actions = [{ shell = "wc -l trimmed.fq > count.txt" }]
        inputs = ["trimmed.fq"]
        outputs = ["count.txt"]
        "#,
    )?;

    let pipeline = load_and_validate(&path)?;
    let options = pipeline.run_options();

    assert_eq!(options.jobs, 3);
    assert!(options.fail_fast);
    assert!(options.targets.is_empty());
    assert_eq!(pipeline.graph.producer_of("trimmed.fq"), Some("trim"));
    assert_eq!(pipeline.graph.dependents_of("trim"), vec!["count"]);
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, PipegraphError::IoError(_)));
}

#[test]
fn malformed_toml_is_a_toml_error() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[[task]\nname = ")?;

    let err = load_and_validate(&path).unwrap_err();
    assert!(matches!(err, PipegraphError::TomlError(_)));
    Ok(())
}

#[test]
fn duplicate_producer_names_both_tasks() {
    let err = PipelineFileBuilder::new()
        .with_task(TaskConfigBuilder::new("a").cmd(&["gen"]).output("out.txt").build())
        .with_task(TaskConfigBuilder::new("b").cmd(&["gen"]).output("out.txt").build())
        .try_build()
        .unwrap_err();

    match err {
        PipegraphError::Construction(ConstructionError::DuplicateProducer {
            artifact,
            first,
            second,
        }) => {
            assert_eq!(artifact, "out.txt");
            assert_eq!((first.as_str(), second.as_str()), ("a", "b"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn duplicate_task_name_is_rejected() {
    let err = PipelineFileBuilder::new()
        .with_task(TaskConfigBuilder::new("a").cmd(&["true"]).build())
        .with_task(TaskConfigBuilder::new("a").cmd(&["false"]).build())
        .try_build()
        .unwrap_err();

    assert!(matches!(
        err,
        PipegraphError::Construction(ConstructionError::DuplicateTask(name)) if name == "a"
    ));
}

#[test]
fn run_once_without_outputs_is_rejected() {
    let err = PipelineFileBuilder::new()
        .with_task(TaskConfigBuilder::new("fetch").shell("curl -O URL").run_once().build())
        .try_build()
        .unwrap_err();

    assert!(matches!(
        err,
        PipegraphError::Construction(ConstructionError::RunOnceWithoutOutputs(_))
    ));
}

#[test]
fn declaration_order_breaks_ties() {
    let pipeline = PipelineFileBuilder::new()
        .jobs(2)
        .with_task(TaskConfigBuilder::new("zeta").cmd(&["true"]).build())
        .with_task(TaskConfigBuilder::new("alpha").cmd(&["true"]).build())
        .with_task(
            TaskConfigBuilder::new("all")
                .after("alpha")
                .after("zeta")
                .build(),
        )
        .build();

    assert_eq!(pipeline.config.jobs, 2);
    assert_eq!(
        pipeline.graph.topological_order(),
        vec!["zeta", "alpha", "all"]
    );
}
