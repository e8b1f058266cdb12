//! Error types for mirrorsync.
//!
//! The engine raises exactly one error kind on its own behalf: an
//! [`ExecutionFailure`], produced whenever an invoked `git` command exits
//! with a non-zero status. Everything else is either caller input rejected
//! before any I/O happens or an I/O error from the host, passed through
//! undecorated.
//!
//! # Example
//!
//! ```
//! use mirrorsync_core::{ExecutionFailure, SyncError};
//!
//! let failure = ExecutionFailure::new("git rev-parse --verify nope^{commit}", Some(128))
//!     .with_stderr("fatal: Needed a single revision\n");
//! let error = SyncError::from(failure);
//!
//! assert!(error.is_execution_failure());
//! assert_eq!(error.exit_code(), Some(128));
//! ```

use std::fmt;
use std::io;

use thiserror::Error;

/// A `git` invocation that exited with a non-zero status.
///
/// Both output streams are captured in full so callers can log them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionFailure {
    /// The command line as it was executed.
    pub command: String,
    /// Exit code, or `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ExecutionFailure {
    /// Creates a failure record with empty output streams.
    pub fn new(command: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            command: command.into(),
            exit_code,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// Attaches captured standard output.
    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    /// Attaches captured standard error.
    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.exit_code {
            Some(code) => write!(f, "'{}' exited with status {}", self.command, code)?,
            None => write!(f, "'{}' was terminated by a signal", self.command)?,
        }

        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            write!(f, ": {}", stderr)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExecutionFailure {}

/// Main error type for synchronization operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An invoked `git` command exited non-zero.
    #[error("command failed: {0}")]
    Execution(#[from] ExecutionFailure),

    /// Host I/O failure (directory creation, process spawn, path lookup).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The caller supplied a malformed revision expression.
    #[error("invalid reference '{reference}': {reason}")]
    InvalidReference {
        /// The rejected input
        reference: String,
        /// Why it was rejected
        reason: String,
    },

    /// `rev-parse` printed something that is not an object name.
    #[error("revision resolved to '{output}', which is not a commit id")]
    InvalidCommit {
        /// Trimmed command output
        output: String,
    },

    /// Settings failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Creates an InvalidReference error.
    pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Creates an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Returns true if a `git` command exited non-zero.
    pub fn is_execution_failure(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns the underlying execution failure, if any.
    pub fn execution(&self) -> Option<&ExecutionFailure> {
        match self {
            Self::Execution(failure) => Some(failure),
            _ => None,
        }
    }

    /// Returns the exit code of a failed command.
    pub fn exit_code(&self) -> Option<i32> {
        self.execution().and_then(|failure| failure.exit_code)
    }
}

/// Type alias for Results with SyncError.
pub type Result<T> = std::result::Result<T, SyncError>;
