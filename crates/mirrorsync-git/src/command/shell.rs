//! Subprocess execution of `git`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use mirrorsync_core::{ExecutionFailure, SyncError};
use tracing::debug;

use super::{CommandOutput, GitInvocation};

/// Something that can run a [`GitInvocation`].
///
/// Implementors must return `Err(SyncError::Execution)` for a non-zero exit
/// status, with both output streams captured, and must hand back stdout
/// untouched on success.
///
/// # Implementors
///
/// - [`ShellGit`] - spawns the real `git` executable
pub trait GitRunner: Send + Sync + fmt::Debug {
    /// Runs the invocation to completion, blocking the calling thread.
    fn run(&self, invocation: &GitInvocation) -> Result<CommandOutput, SyncError>;
}

/// Runs `git` as a child process.
#[derive(Debug, Clone)]
pub struct ShellGit {
    binary: PathBuf,
}

impl ShellGit {
    /// Uses the given executable.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Returns the executable in use.
    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Default for ShellGit {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitRunner for ShellGit {
    fn run(&self, invocation: &GitInvocation) -> Result<CommandOutput, SyncError> {
        let command_line = invocation.display(&self.binary);
        debug!("Running {}", command_line);

        let output = Command::new(&self.binary)
            .args(invocation.argv())
            .env_remove("GIT_DIR")
            .env_remove("GIT_WORK_TREE")
            .env_remove("GIT_INDEX_FILE")
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()?;

        let result = CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if output.status.success() {
            Ok(result)
        } else {
            debug!(
                "{} exited with {:?}: {}",
                command_line,
                result.exit_code,
                result.stderr.trim()
            );
            Err(ExecutionFailure::new(command_line, result.exit_code)
                .with_stdout(result.stdout)
                .with_stderr(result.stderr)
                .into())
        }
    }
}
