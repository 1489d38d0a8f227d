// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::OutputMode;

/// Command-line arguments for `pipegraph`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pipegraph",
    version,
    about = "Run file-based task pipelines, rebuilding only what is stale.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the pipeline file (TOML).
    ///
    /// Default: `Pipegraph.toml` in the current working directory.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PIPEGRAPH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run stale tasks (all tasks, or the named ones and what they need).
    Run(RunArgs),
    /// Remove task outputs.
    Clean(CleanArgs),
    /// Print tasks in execution order without running anything.
    List,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Tasks to bring up to date; empty means every task.
    #[arg(value_name = "TASK")]
    pub tasks: Vec<String>,

    /// Maximum number of tasks running at once (overrides `[config].jobs`).
    #[arg(long, short = 'j', value_name = "N")]
    pub jobs: Option<usize>,

    /// Stop starting new tasks after the first failure.
    #[arg(long)]
    pub fail_fast: bool,

    /// Let task output through to the terminal instead of capturing it.
    #[arg(long, conflicts_with = "output")]
    pub stream: bool,

    /// Output mode for process actions: `capture` or `stream`
    /// (overrides `[config].output`).
    #[arg(long, value_name = "MODE")]
    pub output: Option<OutputMode>,
}

#[derive(Debug, Clone, Args)]
pub struct CleanArgs {
    /// Tasks to clean; empty means every task.
    #[arg(value_name = "TASK")]
    pub tasks: Vec<String>,

    /// Also clean every task downstream of the named ones.
    #[arg(long)]
    pub cascade: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_flags_parse() {
        let args = CliArgs::try_parse_from([
            "pipegraph", "run", "assemble", "qa", "-j", "4", "--fail-fast", "--stream",
        ])
        .unwrap();
        assert_eq!(args.config, None);
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.tasks, ["assemble", "qa"]);
                assert_eq!(run.jobs, Some(4));
                assert!(run.fail_fast);
                assert!(run.stream);
                assert_eq!(run.output, None);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn output_mode_parses_from_its_name() {
        let args = CliArgs::try_parse_from(["pipegraph", "run", "--output", "Stream"]).unwrap();
        match args.command {
            Command::Run(run) => assert_eq!(run.output, Some(OutputMode::Stream)),
            other => panic!("expected run, got {other:?}"),
        }

        assert!(CliArgs::try_parse_from(["pipegraph", "run", "--output", "tee"]).is_err());
        assert!(
            CliArgs::try_parse_from(["pipegraph", "run", "--stream", "--output", "capture"])
                .is_err()
        );
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from([
            "pipegraph", "clean", "trim", "--cascade", "--config", "p.toml", "--log-level", "debug",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("p.toml")));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert!(matches!(args.command, Command::Clean(CleanArgs { cascade: true, .. })));
    }
}
