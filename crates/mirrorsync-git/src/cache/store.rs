//! The on-disk mirror cache.

use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mirrorsync_core::{CommitId, Reference, RemoteId, SyncError};
use tracing::{debug, info};

use crate::command::{GitInvocation, GitRunner};

const HEADS_PREFIX: &str = "refs/heads/";

/// Reports whether a mirror directory exists.
///
/// Production code looks at the filesystem ([`FsInspector`]); tests can
/// substitute an in-memory view.
pub trait MirrorInspector: Send + Sync + fmt::Debug {
    /// Returns true if a mirror is present at `path`.
    fn is_present(&self, path: &Path) -> bool;
}

/// Checks mirror presence on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsInspector;

impl MirrorInspector for FsInspector {
    fn is_present(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

/// A root directory holding one bare mirror per remote.
///
/// Layout: `<root>/<sanitized remote>/`.
pub struct CacheStore {
    root: PathBuf,
    runner: Arc<dyn GitRunner>,
    inspector: Arc<dyn MirrorInspector>,
}

impl CacheStore {
    /// Creates a store rooted at `root`. Nothing is touched on disk until the
    /// first refresh.
    pub fn new(
        root: impl Into<PathBuf>,
        runner: Arc<dyn GitRunner>,
        inspector: Arc<dyn MirrorInspector>,
    ) -> Self {
        Self {
            root: root.into(),
            runner,
            inspector,
        }
    }

    /// Returns the cache root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns where the mirror of `remote` lives.
    pub fn mirror_path(&self, remote: &RemoteId) -> PathBuf {
        self.root.join(remote.sanitized())
    }

    /// Returns true if a mirror of `remote` exists.
    pub fn is_present(&self, remote: &RemoteId) -> bool {
        self.inspector.is_present(&self.mirror_path(remote))
    }

    /// Creates the mirror of `remote`, or fetches into it if it already exists.
    ///
    /// This is the only operation that writes to a mirror.
    pub fn refresh(&self, remote: &RemoteId) -> Result<(), SyncError> {
        let mirror = self.mirror_path(remote);
        if self.inspector.is_present(&mirror) {
            self.update(remote, &mirror)
        } else {
            self.create(remote, &mirror)
        }
    }

    fn create(&self, remote: &RemoteId, mirror: &Path) -> Result<(), SyncError> {
        fs::create_dir_all(&self.root)?;

        info!("Creating mirror of {} at {:?}", remote, mirror);
        self.runner.run(&GitInvocation::new([
            OsStr::new("clone"),
            OsStr::new("--mirror"),
            OsStr::new("--"),
            OsStr::new(remote.as_str()),
            mirror.as_os_str(),
        ]))?;
        Ok(())
    }

    fn update(&self, remote: &RemoteId, mirror: &Path) -> Result<(), SyncError> {
        info!("Updating mirror of {} at {:?}", remote, mirror);
        self.runner
            .run(&GitInvocation::new(["fetch", "--prune"]).git_dir(mirror))?;
        Ok(())
    }

    /// Lists the branch names of the mirror, `refs/heads/` stripped, in the
    /// order git reports them.
    pub fn branches(&self, remote: &RemoteId) -> Result<Vec<String>, SyncError> {
        let mirror = self.mirror_path(remote);
        let output = self.runner.run(
            &GitInvocation::new(["for-each-ref", "--format=%(refname)", HEADS_PREFIX])
                .git_dir(&mirror),
        )?;

        let branches = output
            .stdout
            .lines()
            .filter_map(|line| line.trim().strip_prefix(HEADS_PREFIX))
            .map(str::to_string)
            .collect::<Vec<_>>();

        debug!("Mirror {:?} has {} branches", mirror, branches.len());
        Ok(branches)
    }

    /// Resolves `reference` to a commit against the mirror of `remote`.
    pub fn resolve(&self, remote: &RemoteId, reference: &Reference) -> Result<CommitId, SyncError> {
        let mirror = self.mirror_path(remote);
        let peeled = reference.peeled();
        let output = self.runner.run(
            &GitInvocation::new(["rev-parse", "--verify", peeled.as_str()]).git_dir(&mirror),
        )?;
        CommitId::parse(&output.stdout)
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("root", &self.root)
            .finish()
    }
}

/// Lists branch names advertised by `remote` without a mirror.
pub(crate) fn remote_heads(runner: &dyn GitRunner, remote: &RemoteId) -> Result<Vec<String>, SyncError> {
    let output = runner.run(&GitInvocation::new([
        "ls-remote",
        "--heads",
        "--",
        remote.as_str(),
    ]))?;

    Ok(output
        .stdout
        .lines()
        .filter_map(|line| line.split('\t').nth(1))
        .filter_map(|name| name.trim().strip_prefix(HEADS_PREFIX))
        .map(str::to_string)
        .collect())
}
