#![forbid(unsafe_code)]

use std::process::{Command, Stdio};

// Enough context to diagnose a failure without growing rows unbounded; the
// store truncates again on write.
const MAX_STDERR_CAPTURE: usize = 2_000;

/// Outcome of a command the executor managed to launch. A non-zero exit is a
/// normal failure, not an executor error.
#[derive(Clone, Debug)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn error_summary(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.chars().take(MAX_STDERR_CAPTURE).collect();
        }
        match self.exit_code {
            Some(code) => format!("command exited with status {code}"),
            None => "command terminated by signal".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ExecutorError {
    Spawn(std::io::Error),
}

impl std::fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Spawn(err) => write!(f, "could not launch command: {err}"),
        }
    }
}

impl std::error::Error for ExecutorError {}

/// Run `command` through the shell and wait for it, capturing output.
///
/// Commands go through `sh -c` so pipelines and redirection in user input
/// keep working; the caller controls the command string.
pub fn run_shell(command: &str) -> Result<CommandOutput, ExecutorError> {
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .output()
        .map_err(ExecutorError::Spawn)?;

    Ok(CommandOutput {
        exit_code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
