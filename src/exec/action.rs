// src/exec/action.rs

//! Runs one action and reports success or failure.

use std::collections::VecDeque;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, trace};

use crate::task::{Action, InProcessAction, ProcessAction};
use crate::types::OutputMode;

/// Lines of captured stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 20;

/// Why a single action failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionError {
    pub exit_code: Option<i32>,
    pub message: String,
}

impl ActionError {
    fn message(message: impl Into<String>) -> Self {
        Self {
            exit_code: None,
            message: message.into(),
        }
    }
}

/// Execute `action` to completion. Never retried.
pub async fn run_action(action: &Action, output: OutputMode) -> Result<(), ActionError> {
    match action {
        Action::Process(p) => run_process(p, output).await,
        Action::InProcess(f) => run_in_process(f).await,
    }
}

async fn run_process(action: &ProcessAction, output: OutputMode) -> Result<(), ActionError> {
    let mut cmd = Command::new(action.program());
    cmd.args(action.arg_list()).kill_on_drop(true);

    debug!(cmd = %action.command_line(), ?output, "spawning process");

    match output {
        OutputMode::Stream => {
            let status = cmd
                .stdin(Stdio::null())
                .status()
                .await
                .map_err(|e| spawn_error(action, e))?;

            if status.success() {
                Ok(())
            } else {
                Err(ActionError {
                    exit_code: status.code(),
                    message: format!("`{}` exited with {status}", action.command_line()),
                })
            }
        }
        OutputMode::Capture => {
            let mut child = cmd
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .map_err(|e| spawn_error(action, e))?;

            let stdout = child.stdout.take();
            let stderr = child.stderr.take();

            let program = action.program();
            let drain_stdout = async {
                if let Some(stdout) = stdout {
                    let mut lines = BufReader::new(stdout).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        trace!(program = %program, "stdout: {}", line);
                    }
                }
            };
            let drain_stderr = async {
                let mut tail = StderrTail::default();
                if let Some(stderr) = stderr {
                    let mut lines = BufReader::new(stderr).lines();
                    while let Ok(Some(line)) = lines.next_line().await {
                        debug!(program = %program, "stderr: {}", line);
                        tail.push(line);
                    }
                }
                tail
            };

            let ((), tail, status) = tokio::join!(drain_stdout, drain_stderr, child.wait());
            let status = status.map_err(|e| {
                ActionError::message(format!("waiting for `{}`: {e}", action.command_line()))
            })?;

            if status.success() {
                Ok(())
            } else {
                let message = if tail.is_empty() {
                    format!("`{}` exited with {status}", action.command_line())
                } else {
                    tail.join()
                };
                Err(ActionError {
                    exit_code: status.code(),
                    message,
                })
            }
        }
    }
}

async fn run_in_process(action: &InProcessAction) -> Result<(), ActionError> {
    let action = action.clone();
    let label = action.label().to_string();

    match tokio::task::spawn_blocking(move || action.call()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(ActionError::message(format!("{err:#}"))),
        Err(join) if join.is_panic() => {
            Err(ActionError::message(format!("`{label}` panicked")))
        }
        Err(join) => Err(ActionError::message(format!("`{label}` did not complete: {join}"))),
    }
}

fn spawn_error(action: &ProcessAction, err: std::io::Error) -> ActionError {
    ActionError::message(format!("failed to spawn `{}`: {err}", action.program()))
}

/// The last `STDERR_TAIL_LINES` lines a process wrote to stderr.
#[derive(Debug, Default)]
struct StderrTail {
    lines: VecDeque<String>,
}

impl StderrTail {
    fn push(&mut self, line: String) {
        if self.lines.len() == STDERR_TAIL_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.trim().is_empty())
    }

    fn join(&self) -> String {
        let joined = self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n");
        joined.trim_end().to_string()
    }
}
