// src/lib.rs

pub mod clean;
pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod task;
pub mod types;

pub use pipeline::Pipeline;

use anyhow::{Result, bail};
use tracing::{debug, info, warn};

use crate::cli::{CleanArgs, CliArgs, Command, RunArgs};
use crate::config::{default_config_path, load_and_validate};
use crate::config::model::PipelineFile;
use crate::engine::RunReport;
use crate::types::{OutputMode, RunOptions};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - pipeline file loading
/// - the `run`, `clean` and `list` commands
/// - Ctrl-C handling (cancel, let running tasks finish)
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let pipeline_file = load_and_validate(&config_path)?;
    debug!(
        config = %config_path.display(),
        tasks = pipeline_file.graph.len(),
        "pipeline loaded"
    );

    match args.command {
        Command::Run(run_args) => run_command(pipeline_file, run_args).await,
        Command::Clean(clean_args) => clean_command(pipeline_file, clean_args).await,
        Command::List => {
            print_listing(&pipeline_file);
            Ok(())
        }
    }
}

async fn run_command(pipeline_file: PipelineFile, args: RunArgs) -> Result<()> {
    let options = run_options(&pipeline_file, args);
    info!(jobs = options.jobs, fail_fast = options.fail_fast, "starting run");

    let pipeline = Pipeline::from_graph(pipeline_file.graph);
    let report = pipeline.run_until(&options, ctrl_c()).await?;

    println!("{report}");
    check_report(&report)
}

/// A run that failed or was cut short exits non-zero.
fn check_report(report: &RunReport) -> Result<()> {
    let summary = report.summary();
    if summary.failed > 0 {
        bail!("{} task(s) failed", summary.failed);
    }
    if summary.cancelled > 0 {
        bail!("run cancelled; {} task(s) did not run", summary.cancelled);
    }
    Ok(())
}

/// CLI flags override `[config]`.
fn run_options(pipeline_file: &PipelineFile, args: RunArgs) -> RunOptions {
    let mut options = pipeline_file.run_options();
    if let Some(jobs) = args.jobs {
        options.jobs = jobs;
    }
    options.fail_fast |= args.fail_fast;
    if let Some(output) = args.output {
        options.output = output;
    }
    if args.stream {
        options.output = OutputMode::Stream;
    }
    options.targets = args.tasks;
    options
}

async fn clean_command(pipeline_file: PipelineFile, args: CleanArgs) -> Result<()> {
    let output = pipeline_file.config.output;
    let pipeline = Pipeline::from_graph(pipeline_file.graph);
    let cleaner = pipeline.cleaner().with_output(output);

    let report = if args.tasks.is_empty() {
        cleaner.clean_all().await
    } else {
        cleaner.clean_many(&args.tasks, args.cascade).await?
    };

    print!("{report}");

    let errors = report.errors().count();
    if errors > 0 {
        bail!("{errors} cleanup target(s) could not be removed");
    }
    Ok(())
}

/// Resolves on the first Ctrl-C. If the handler cannot be installed the
/// run simply cannot be interrupted.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C received; letting running tasks finish");
}

/// Dry-run listing: tasks in execution order with their artifacts.
fn print_listing(pipeline_file: &PipelineFile) {
    let graph = &pipeline_file.graph;
    let cfg = &pipeline_file.config;

    println!("pipegraph list");
    println!("  config.jobs = {}", cfg.jobs);
    println!("  config.fail_fast = {}", cfg.fail_fast);
    println!("  config.output = {:?}", cfg.output);
    println!();

    println!("tasks ({}):", graph.len());
    for name in graph.topological_order() {
        let Some(task) = graph.task(&name) else {
            continue;
        };
        println!("  - {}", task.title());
        if !task.inputs().is_empty() {
            println!("      inputs: {}", join(task.inputs()));
        }
        if !task.outputs().is_empty() {
            println!("      outputs: {}", join(task.outputs()));
        }
        let deps = graph.predecessors_of(&name);
        if !deps.is_empty() {
            println!("      after: {deps:?}");
        }
        println!("      policy: {:?}", task.policy());
    }

    debug!("list complete (no execution)");
}

fn join<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{ActionFailure, TaskReport, TaskStatus};

    fn report(statuses: &[(&str, TaskStatus)]) -> RunReport {
        RunReport {
            run_id: 1,
            tasks: statuses
                .iter()
                .map(|(name, status)| TaskReport {
                    name: name.to_string(),
                    status: status.clone(),
                    ran: matches!(status, TaskStatus::Succeeded | TaskStatus::Failed(_)),
                })
                .collect(),
        }
    }

    #[test]
    fn complete_run_exits_cleanly() {
        let report = report(&[
            ("trim", TaskStatus::Succeeded),
            ("stats", TaskStatus::SkippedUpToDate),
        ]);
        assert!(check_report(&report).is_ok());
    }

    #[test]
    fn interrupted_run_is_an_error() {
        let report = report(&[
            ("trim", TaskStatus::Succeeded),
            ("assemble", TaskStatus::SkippedCancelled),
        ]);
        let err = check_report(&report).unwrap_err();
        assert!(err.to_string().contains("cancelled"), "{err}");
    }

    #[test]
    fn failures_are_reported_before_cancellations() {
        let report = report(&[
            (
                "trim",
                TaskStatus::Failed(ActionFailure {
                    action_index: 0,
                    exit_code: Some(2),
                    message: "bad reads".into(),
                }),
            ),
            ("assemble", TaskStatus::SkippedBlocked),
            ("stats", TaskStatus::SkippedCancelled),
        ]);
        let err = check_report(&report).unwrap_err();
        assert_eq!(err.to_string(), "1 task(s) failed");
    }
}
