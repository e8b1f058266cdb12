//! One synchronizer per remote.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use mirrorsync_core::{RemoteId, SyncSettings};
use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{CacheStore, FsInspector, MirrorInspector};
use crate::command::{GitRunner, ShellGit};
use crate::synchronizer::Synchronizer;

/// Hands out the same [`Synchronizer`] for the same remote string.
///
/// Call sites share a registry by reference; every sync for a remote then
/// funnels through one coordinator, which is what keeps the mirror from being
/// refreshed twice or concurrently. Registries are independent of each other,
/// so differently configured ones can coexist in one process.
pub struct SynchronizerRegistry {
    store: Option<Arc<CacheStore>>,
    runner: Arc<dyn GitRunner>,
    synchronizers: Mutex<IndexMap<RemoteId, Arc<Synchronizer>>>,
}

impl SynchronizerRegistry {
    /// Creates a registry that runs the configured `git` binary and inspects
    /// the real filesystem.
    pub fn new(settings: &SyncSettings) -> Self {
        Self::with_components(
            settings.cache_root().map(Path::to_path_buf),
            Arc::new(ShellGit::new(settings.git_binary())),
            Arc::new(FsInspector),
        )
    }

    /// Creates a registry from explicit collaborators.
    pub fn with_components(
        cache_root: Option<PathBuf>,
        runner: Arc<dyn GitRunner>,
        inspector: Arc<dyn MirrorInspector>,
    ) -> Self {
        let store = cache_root.map(|root| Arc::new(CacheStore::new(root, Arc::clone(&runner), inspector)));
        Self {
            store,
            runner,
            synchronizers: Mutex::new(IndexMap::new()),
        }
    }

    /// Returns the synchronizer for `remote`, creating it on first use.
    pub fn get_or_create(&self, remote: impl Into<RemoteId>) -> Arc<Synchronizer> {
        let remote = remote.into();
        let mut synchronizers = self.synchronizers.lock();

        if let Some(existing) = synchronizers.get(remote.as_str()) {
            return Arc::clone(existing);
        }

        debug!("Creating synchronizer for {}", remote);
        let synchronizer = Arc::new(Synchronizer::new(
            remote.clone(),
            self.store.clone(),
            Arc::clone(&self.runner),
        ));
        synchronizers.insert(remote, Arc::clone(&synchronizer));
        synchronizer
    }

    /// Returns the synchronizer for `remote` if one was created.
    pub fn get(&self, remote: &str) -> Option<Arc<Synchronizer>> {
        self.synchronizers.lock().get(remote).cloned()
    }

    /// Returns the cache root, if caching is enabled.
    pub fn cache_root(&self) -> Option<&Path> {
        self.store.as_deref().map(CacheStore::root)
    }

    /// Remotes with a synchronizer, in creation order.
    pub fn remotes(&self) -> Vec<RemoteId> {
        self.synchronizers.lock().keys().cloned().collect()
    }

    /// Number of synchronizers created.
    pub fn len(&self) -> usize {
        self.synchronizers.lock().len()
    }

    /// Returns true if no synchronizer was created yet.
    pub fn is_empty(&self) -> bool {
        self.synchronizers.lock().is_empty()
    }
}

impl fmt::Debug for SynchronizerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynchronizerRegistry")
            .field("cache_root", &self.cache_root())
            .field("remotes", &self.len())
            .finish()
    }
}
