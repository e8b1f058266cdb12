//! A single `git` invocation and its captured result.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Arguments plus the explicit repository location for one `git` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitInvocation {
    git_dir: Option<PathBuf>,
    work_tree: Option<PathBuf>,
    args: Vec<OsString>,
}

impl GitInvocation {
    /// Creates an invocation that is not bound to any repository (`clone`, `ls-remote`).
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Self {
            git_dir: None,
            work_tree: None,
            args: args.into_iter().map(|a| a.as_ref().to_os_string()).collect(),
        }
    }

    /// Sets the object database (`--git-dir`).
    pub fn git_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.git_dir = Some(path.into());
        self
    }

    /// Sets the checkout location (`--work-tree`).
    pub fn work_tree(mut self, path: impl Into<PathBuf>) -> Self {
        self.work_tree = Some(path.into());
        self
    }

    /// Binds the invocation to a non-bare repository rooted at `path`.
    pub fn in_worktree(self, path: &Path) -> Self {
        self.git_dir(path.join(".git")).work_tree(path)
    }

    /// Returns the explicit object database, if any.
    pub fn repository(&self) -> Option<&Path> {
        self.git_dir.as_deref()
    }

    /// Returns the explicit working tree, if any.
    pub fn worktree(&self) -> Option<&Path> {
        self.work_tree.as_deref()
    }

    /// Returns the subcommand arguments (without the global overrides).
    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Returns the subcommand name, e.g. `fetch`.
    pub fn subcommand(&self) -> Option<&OsStr> {
        self.args.first().map(OsString::as_os_str)
    }

    /// Full argument vector handed to the executable, overrides first.
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        if let Some(dir) = &self.git_dir {
            let mut flag = OsString::from("--git-dir=");
            flag.push(dir);
            argv.push(flag);
        }
        if let Some(tree) = &self.work_tree {
            let mut flag = OsString::from("--work-tree=");
            flag.push(tree);
            argv.push(flag);
        }
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Human readable command line for logs and error messages.
    pub fn display(&self, program: &Path) -> String {
        std::iter::once(program.as_os_str().to_os_string())
            .chain(self.argv())
            .map(|a| a.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Status and captured streams of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` if killed by a signal.
    pub exit_code: Option<i32>,
    /// Standard output, verbatim.
    pub stdout: String,
    /// Standard error, verbatim.
    pub stderr: String,
}

impl CommandOutput {
    /// A successful run that printed `stdout`.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Returns true for a zero exit status.
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }
}
