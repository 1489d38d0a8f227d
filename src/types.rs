use std::str::FromStr;
use serde::Deserialize;

/// What happens to the stdout/stderr of process actions.
///
/// - `Capture`: both streams are piped and logged line by line, and
///   the tail of stderr is attached to the failure detail (default).
/// - `Stream`: both streams are inherited from the engine process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    #[default]
    Capture,
    Stream,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "capture" => Ok(OutputMode::Capture),
            "stream" => Ok(OutputMode::Stream),
            other => Err(format!(
                "invalid output mode: {other} (expected \"capture\" or \"stream\")"
            )),
        }
    }
}

/// Options for a single execution of the task graph.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Maximum number of tasks executing at the same time (at least 1).
    pub jobs: usize,
    /// Stop starting new tasks after the first failure.
    pub fail_fast: bool,
    pub output: OutputMode,
    /// Restrict the run to these tasks and everything they depend on.
    /// Empty means every task in the graph.
    pub targets: Vec<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            fail_fast: false,
            output: OutputMode::default(),
            targets: Vec::new(),
        }
    }
}
