// src/task/action.rs

//! The two kinds of work a task performs.
//!
//! Process actions are kept structured as `(program, args)` so arguments
//! never pass through shell quoting unless a caller explicitly asks for a
//! shell with [`ProcessAction::shell`].

use std::fmt;
use std::sync::Arc;

/// An external program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessAction {
    program: String,
    args: Vec<String>,
}

impl ProcessAction {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run `cmd` through `sh -c`, for pipelines and redirections.
    pub fn shell(cmd: impl Into<String>) -> Self {
        Self::new("sh").arg("-c").arg(cmd)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arg_list(&self) -> &[String] {
        &self.args
    }

    /// Human-readable command line; arguments containing whitespace are quoted.
    pub fn command_line(&self) -> String {
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|part| {
                if part.is_empty() || part.chars().any(char::is_whitespace) {
                    format!("'{}'", part.replace('\'', "'\\''"))
                } else {
                    part.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub type ActionFn = Arc<dyn Fn() -> anyhow::Result<()> + Send + Sync>;

/// A caller-supplied function whose arguments were captured when the task
/// was constructed.
#[derive(Clone)]
pub struct InProcessAction {
    label: String,
    func: ActionFn,
}

impl InProcessAction {
    pub fn new<F>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn call(&self) -> anyhow::Result<()> {
        (self.func)()
    }
}

impl fmt::Debug for InProcessAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InProcessAction")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    Process(ProcessAction),
    InProcess(InProcessAction),
}

impl Action {
    pub fn process<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Action::Process(ProcessAction::new(program).args(args))
    }

    pub fn shell(cmd: impl Into<String>) -> Self {
        Action::Process(ProcessAction::shell(cmd))
    }

    pub fn in_process<F>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Action::InProcess(InProcessAction::new(label, func))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Process(p) => write!(f, "Cmd: {}", p.command_line()),
            Action::InProcess(a) => write!(f, "Fn: {}", a.label()),
        }
    }
}

impl From<ProcessAction> for Action {
    fn from(action: ProcessAction) -> Self {
        Action::Process(action)
    }
}

impl From<InProcessAction> for Action {
    fn from(action: InProcessAction) -> Self {
        Action::InProcess(action)
    }
}
