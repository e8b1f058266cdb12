//! Operations on a caller-owned working directory.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use mirrorsync_core::{CommitId, Reference, RemoteId, SyncError};
use tracing::{debug, info};

use crate::command::{GitInvocation, GitRunner};

/// Remote-tracking namespace for history fetched from a cache mirror.
pub const CACHE_ALIAS: &str = "cache";

/// A checkout location, normalized to an absolute path.
pub struct WorkingDir<'a> {
    path: PathBuf,
    runner: &'a dyn GitRunner,
}

impl<'a> WorkingDir<'a> {
    /// Binds `path` (made absolute against the current directory).
    pub fn open(path: &Path, runner: &'a dyn GitRunner) -> Result<Self, SyncError> {
        Ok(Self {
            path: std::path::absolute(path)?,
            runner,
        })
    }

    /// Returns the absolute path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true if the directory already holds repository metadata.
    pub fn has_metadata(&self) -> bool {
        self.path.join(".git").exists()
    }

    /// Clones `remote` into the directory without checking anything out.
    ///
    /// With `object_store`, the clone borrows objects from that repository
    /// (`--reference`) instead of downloading them again.
    pub fn clone_from(&self, remote: &RemoteId, object_store: Option<&Path>) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut args = vec![OsStr::new("clone"), OsStr::new("--no-checkout")];
        if let Some(store) = object_store {
            args.push(OsStr::new("--reference"));
            args.push(store.as_os_str());
        }
        args.extend([
            OsStr::new("--"),
            OsStr::new(remote.as_str()),
            self.path.as_os_str(),
        ]);

        info!("Cloning {} into {:?}", remote, self.path);
        self.runner.run(&GitInvocation::new(args))?;
        Ok(())
    }

    /// Fetches every branch and tag of `source` (a URL or a local mirror path),
    /// pruning remote-tracking refs under `refs/remotes/<alias>/` that vanished.
    pub fn fetch_from(&self, source: &OsStr, alias: &str) -> Result<(), SyncError> {
        let heads = format!("+refs/heads/*:refs/remotes/{}/*", alias);

        debug!("Fetching {:?} into {:?}", source, self.path);
        self.runner.run(
            &GitInvocation::new([
                OsStr::new("fetch"),
                OsStr::new("--prune"),
                OsStr::new("--"),
                source,
                OsStr::new(heads.as_str()),
                OsStr::new("+refs/tags/*:refs/tags/*"),
            ])
            .in_worktree(&self.path),
        )?;
        Ok(())
    }

    /// Mirrors every branch and tag of `source` into the repository's own
    /// `refs/heads/*` and `refs/tags/*`, pruning branches that vanished.
    ///
    /// Used when the directory itself is the resolution repository. HEAD is
    /// kept detached by [`WorkingDir::reset_hard`], so no branch is checked
    /// out and every local branch matches the remote after the fetch.
    pub fn fetch_branches(&self, source: &OsStr) -> Result<(), SyncError> {
        debug!("Fetching branches of {:?} into {:?}", source, self.path);
        self.runner.run(
            &GitInvocation::new([
                OsStr::new("fetch"),
                OsStr::new("--prune"),
                OsStr::new("--update-head-ok"),
                OsStr::new("--"),
                source,
                OsStr::new("+refs/heads/*:refs/heads/*"),
                OsStr::new("+refs/tags/*:refs/tags/*"),
            ])
            .in_worktree(&self.path),
        )?;
        Ok(())
    }

    /// Resolves `reference` to a commit against this repository.
    pub fn resolve(&self, reference: &Reference) -> Result<CommitId, SyncError> {
        let peeled = reference.peeled();
        let output = self.runner.run(
            &GitInvocation::new(["rev-parse", "--verify", peeled.as_str()])
                .git_dir(self.path.join(".git")),
        )?;
        CommitId::parse(&output.stdout)
    }

    /// Detaches HEAD at `commit`, then discards local modifications so the
    /// tree matches it. No branch ref is ever moved.
    pub fn reset_hard(&self, commit: &CommitId) -> Result<(), SyncError> {
        self.runner.run(
            &GitInvocation::new(["update-ref", "--no-deref", "HEAD", commit.as_str()])
                .git_dir(self.path.join(".git")),
        )?;
        self.runner.run(
            &GitInvocation::new(["reset", "--hard", "--quiet", commit.as_str()])
                .in_worktree(&self.path),
        )?;
        Ok(())
    }
}
