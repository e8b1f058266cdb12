//! Execution of the `git` command-line tool.
//!
//! Every invocation names its repository explicitly (`--git-dir`, and
//! `--work-tree` where a checkout is involved), so nothing depends on the
//! process's current directory or on `GIT_DIR` style environment variables.

mod invocation;
mod shell;

pub use invocation::{CommandOutput, GitInvocation};
pub use shell::{GitRunner, ShellGit};
