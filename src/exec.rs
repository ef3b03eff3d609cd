//! Running external commands and capturing their result.

use std::process::{Command, Output};

use tracing::debug;

use crate::error::{Result, TorError};

/// Exit status and captured output of an external command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// stdout when non-empty, stderr otherwise.
    pub fn text(&self) -> &str {
        let stdout = self.stdout.trim();
        if stdout.is_empty() {
            self.stderr.trim()
        } else {
            stdout
        }
    }

    /// Error text for a failed command: stderr first, stdout as fallback.
    pub fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        let text = if stderr.is_empty() {
            self.stdout.trim()
        } else {
            stderr
        };
        if text.is_empty() {
            "exited with non-zero status".to_string()
        } else {
            text.to_string()
        }
    }

    /// `Ok(self)` on success, `CommandFailed` with `context` otherwise.
    pub fn into_result(self, context: &str) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(TorError::CommandFailed(format!(
                "{}: {}",
                context,
                self.diagnostic()
            )))
        }
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Run `cmd` to completion, capturing stdout and stderr.
///
/// Spawn failures become `CommandFailed`; a non-zero exit is reported through
/// [`CommandOutput::success`], not as an error.
pub fn run(cmd: &mut Command) -> Result<CommandOutput> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    debug!("Running {:?}", cmd);

    match cmd.output() {
        Ok(output) => Ok(output.into()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(TorError::CommandFailed(
            format!("{} not found", program),
        )),
        Err(e) => Err(TorError::CommandFailed(format!("{}: {}", program, e))),
    }
}
