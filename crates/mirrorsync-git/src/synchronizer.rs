//! Per-remote coordination of mirror refreshes and working-directory syncs.

use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use mirrorsync_core::{CommitId, Reference, RemoteId, SyncError};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheStore, MirrorState, RefreshState, remote_heads};
use crate::command::GitRunner;
use crate::worktree::{CACHE_ALIAS, WorkingDir};

/// Options for [`Synchronizer::sync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Refresh the mirror (at most once per synchronizer) before syncing.
    pub update_cache: bool,
}

impl SyncOptions {
    /// Sync from whatever the mirror currently holds.
    pub fn without_cache_update() -> Self {
        Self {
            update_cache: false,
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self { update_cache: true }
    }
}

/// Options for [`Synchronizer::cache`] and [`Synchronizer::branches`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheOptions {
    /// Refresh even if this synchronizer already refreshed the mirror.
    pub force: bool,
}

impl CacheOptions {
    /// Always refresh.
    pub fn forced() -> Self {
        Self { force: true }
    }
}

/// Coordinator for one remote.
///
/// Obtain instances from [`crate::SynchronizerRegistry`] so that every caller
/// syncing the same remote shares one freshness state. The state lock is held
/// for the whole refresh, which serializes concurrent refreshes of a mirror.
pub struct Synchronizer {
    remote: RemoteId,
    store: Option<Arc<CacheStore>>,
    mirror_path: Option<PathBuf>,
    runner: Arc<dyn GitRunner>,
    refresh: Mutex<RefreshState>,
}

impl Synchronizer {
    /// Binds a synchronizer to `remote`. Performs no I/O.
    pub fn new(remote: RemoteId, store: Option<Arc<CacheStore>>, runner: Arc<dyn GitRunner>) -> Self {
        let mirror_path = store.as_ref().map(|s| s.mirror_path(&remote));
        Self {
            remote,
            store,
            mirror_path,
            runner,
            refresh: Mutex::new(RefreshState::new()),
        }
    }

    /// Returns the remote this synchronizer serves.
    pub fn remote(&self) -> &RemoteId {
        &self.remote
    }

    /// Returns the derived mirror location, `None` without a cache root.
    pub fn mirror_path(&self) -> Option<&Path> {
        self.mirror_path.as_deref()
    }

    /// Returns true if a mirror exists on disk.
    pub fn is_cached(&self) -> bool {
        self.store
            .as_ref()
            .is_some_and(|store| store.is_present(&self.remote))
    }

    /// Returns the current mirror state.
    pub fn mirror_state(&self) -> MirrorState {
        let present = self.is_cached();
        self.refresh.lock().state(present)
    }

    /// Number of successful refreshes by this synchronizer.
    pub fn refresh_count(&self) -> u32 {
        self.refresh.lock().refresh_count()
    }

    /// Time of the last successful refresh.
    pub fn last_refresh(&self) -> Option<Instant> {
        self.refresh.lock().last_refresh()
    }

    /// Refresh failures since the last successful refresh.
    pub fn failure_count(&self) -> u32 {
        self.refresh.lock().failure_count()
    }

    /// Message of the last failed refresh.
    pub fn last_error(&self) -> Option<String> {
        self.refresh.lock().last_error().map(str::to_string)
    }

    /// Refreshes the mirror unless this synchronizer already did (or `force`).
    pub fn cache(&self, options: CacheOptions) -> Result<(), SyncError> {
        let mut state = self.refresh.lock();
        if !state.needs_refresh(options.force) {
            debug!("Mirror of {} already refreshed, skipping", self.remote);
            return Ok(());
        }
        self.refresh_locked(&mut state)
    }

    /// Refreshes the mirror unconditionally: fetch with prune if it exists,
    /// full mirror clone otherwise. A no-op without a cache root.
    pub fn refresh(&self) -> Result<(), SyncError> {
        let mut state = self.refresh.lock();
        self.refresh_locked(&mut state)
    }

    fn refresh_locked(&self, state: &mut RefreshState) -> Result<(), SyncError> {
        let Some(store) = &self.store else {
            debug!("No cache root configured, not caching {}", self.remote);
            return Ok(());
        };

        match store.refresh(&self.remote) {
            Ok(()) => {
                state.record_success();
                Ok(())
            },
            Err(e) => {
                warn!("Refreshing mirror of {} failed: {}", self.remote, e);
                state.record_failure(e.to_string());
                Err(e)
            },
        }
    }

    /// Lists the remote's branches.
    ///
    /// Refreshes first when `options.force` is set or no mirror exists yet.
    /// Without a cache root the remote is queried directly.
    pub fn branches(&self, options: CacheOptions) -> Result<Vec<String>, SyncError> {
        let Some(store) = &self.store else {
            return remote_heads(self.runner.as_ref(), &self.remote);
        };

        if options.force || !self.is_cached() {
            self.cache(options)?;
        }
        store.branches(&self.remote)
    }

    /// Brings `working_dir` to the commit `reference` names.
    ///
    /// Clones when the directory has no repository metadata, fetches
    /// otherwise, then resolves `reference` afresh and hard-resets to the
    /// resulting commit with HEAD detached. Returns that commit.
    ///
    /// Without a usable mirror the directory is its own resolution
    /// repository: its local branches are overwritten with the remote's on
    /// every fetch, so `main`, `refs/heads/main` and `main~1` all name the
    /// remote's history, never a previous sync.
    ///
    /// # Errors
    ///
    /// Any failing `git` command surfaces as [`SyncError::Execution`]. A
    /// reference that does not resolve fails before the reset, leaving the
    /// checkout untouched. Nothing is retried or rolled back.
    pub fn sync(
        &self,
        working_dir: impl AsRef<Path>,
        reference: &Reference,
        options: SyncOptions,
    ) -> Result<CommitId, SyncError> {
        let worktree = WorkingDir::open(working_dir.as_ref(), self.runner.as_ref())?;

        if options.update_cache {
            self.cache(CacheOptions::default())?;
        }

        let mirror = self.mirror_path().filter(|_| self.is_cached());

        let remote = OsStr::new(self.remote.as_str());
        match (worktree.has_metadata(), mirror) {
            (true, Some(mirror)) => worktree.fetch_from(mirror.as_os_str(), CACHE_ALIAS)?,
            (true, None) => worktree.fetch_branches(remote)?,
            (false, Some(mirror)) => worktree.clone_from(&self.remote, Some(mirror))?,
            (false, None) => {
                worktree.clone_from(&self.remote, None)?;
                worktree.fetch_branches(remote)?;
            },
        }

        let commit = self.resolve(&worktree, mirror, reference)?;

        if let Err(e) = worktree.reset_hard(&commit) {
            error!(
                "unable to locate commit object {} in repo {}",
                commit,
                worktree.path().display()
            );
            return Err(e);
        }

        if reference.is_commit_id() {
            info!("Synced {} to {}", worktree.path().display(), commit);
        } else {
            info!(
                "Synced {} to {} ({})",
                worktree.path().display(),
                reference,
                commit.short()
            );
        }
        Ok(commit)
    }

    fn resolve(
        &self,
        worktree: &WorkingDir<'_>,
        mirror: Option<&Path>,
        reference: &Reference,
    ) -> Result<CommitId, SyncError> {
        match (mirror, &self.store) {
            (Some(mirror), Some(store)) => store.resolve(&self.remote, reference).inspect_err(|_| {
                error!("could not resolve ref for cache {}", mirror.display());
            }),
            _ => worktree.resolve(reference).inspect_err(|_| {
                error!(
                    "could not resolve ref {} in repo {}",
                    reference,
                    worktree.path().display()
                );
            }),
        }
    }
}

impl fmt::Debug for Synchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Synchronizer")
            .field("remote", &self.remote)
            .field("mirror_path", &self.mirror_path)
            .field("state", &self.mirror_state())
            .field("failures", &self.failure_count())
            .finish()
    }
}
