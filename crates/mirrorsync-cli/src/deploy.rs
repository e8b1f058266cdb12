//! Deploying many modules, each through its remote's synchronizer.
//!
//! A failed module is logged and recorded; it never aborts its siblings.

use std::error::Error as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use mirrorsync_core::{CommitId, Reference, SyncError};
use mirrorsync_git::{SyncOptions, Synchronizer, SynchronizerRegistry};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::manifest::ResolvedModule;

/// Something that can be brought to its configured revision on disk.
pub trait Deployable: Send + Sync {
    /// Name used in logs and reports.
    fn name(&self) -> &str;

    /// Directory the module is materialized into.
    fn full_path(&self) -> &Path;

    /// Synchronizes the directory and returns the commit it now holds.
    fn sync(&self, options: SyncOptions) -> Result<CommitId, SyncError>;
}

/// A manifest module backed by a git remote.
#[derive(Debug)]
pub struct GitModule {
    name: String,
    full_path: PathBuf,
    reference: Reference,
    synchronizer: Arc<Synchronizer>,
}

impl GitModule {
    /// Binds `module` to the registry's synchronizer for its remote.
    pub fn new(module: &ResolvedModule, registry: &SynchronizerRegistry) -> Self {
        Self {
            name: module.name.clone(),
            full_path: module.full_path.clone(),
            reference: module.reference.clone(),
            synchronizer: registry.get_or_create(module.remote.clone()),
        }
    }
}

impl Deployable for GitModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn full_path(&self) -> &Path {
        &self.full_path
    }

    fn sync(&self, options: SyncOptions) -> Result<CommitId, SyncError> {
        self.synchronizer.sync(&self.full_path, &self.reference, options)
    }
}

/// Result of deploying one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleOutcome {
    /// Module name from the manifest.
    pub name: String,
    /// Directory the module was synced into.
    pub path: PathBuf,
    /// Commit the directory now holds, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<CommitId>,
    /// Rendered error, on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock time spent in the sync, saturating at `u64::MAX`.
    pub elapsed_ms: u64,
}

impl ModuleOutcome {
    /// True when the module reached its revision.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcomes of a deploy, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    /// One outcome per module.
    pub modules: Vec<ModuleOutcome>,
}

impl DeployReport {
    /// Number of modules that deployed.
    pub fn succeeded(&self) -> usize {
        self.modules.iter().filter(|m| m.is_success()).count()
    }

    /// Number of modules that failed.
    pub fn failed(&self) -> usize {
        self.modules.len() - self.succeeded()
    }

    /// True when every module deployed.
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

/// Deploys one module, logging the outcome instead of returning an error.
///
/// With `trace` set, a failure additionally logs its cause chain and, for
/// failed `git` commands, the command line with both captured streams.
pub fn deploy_module(module: &dyn Deployable, options: SyncOptions, trace: bool) -> ModuleOutcome {
    let started = Instant::now();
    info!("Deploying {} into {}", module.name(), module.full_path().display());

    let result = module.sync(options);
    let elapsed_ms = whole_millis(started.elapsed());

    match result {
        Ok(commit) => {
            info!(
                module = module.name(),
                elapsed_ms, "Deployed {} at {}", module.name(), commit.short()
            );
            ModuleOutcome {
                name: module.name().to_string(),
                path: module.full_path().to_path_buf(),
                commit: Some(commit),
                error: None,
                elapsed_ms,
            }
        },
        Err(err) => {
            error!(module = module.name(), "Failed to deploy {}: {}", module.name(), err);
            if trace {
                log_trace(&err);
            }
            ModuleOutcome {
                name: module.name().to_string(),
                path: module.full_path().to_path_buf(),
                commit: None,
                error: Some(err.to_string()),
                elapsed_ms,
            }
        },
    }
}

fn whole_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

fn log_trace(err: &SyncError) {
    if let Some(failure) = err.execution() {
        error!(exit_code = ?failure.exit_code, "command: {}", failure.command);
        for line in failure.stdout.lines() {
            error!("stdout: {}", line);
        }
        for line in failure.stderr.lines() {
            error!("stderr: {}", line);
        }
    }

    let mut source = err.source();
    while let Some(cause) = source {
        error!("caused by: {}", cause);
        source = cause.source();
    }
}

/// Deploys every module on up to `jobs` worker threads.
///
/// Modules sharing a remote share its synchronizer, so the mirror is still
/// refreshed at most once. The report lists modules in input order.
pub fn deploy_all(
    modules: &[Box<dyn Deployable>],
    options: SyncOptions,
    trace: bool,
    jobs: usize,
) -> DeployReport {
    let workers = jobs.clamp(1, modules.len().max(1));
    debug!("Deploying {} modules with {} workers", modules.len(), workers);

    if workers == 1 {
        let outcomes = modules
            .iter()
            .map(|module| deploy_module(module.as_ref(), options, trace))
            .collect();
        return DeployReport { modules: outcomes };
    }

    let queue = Mutex::new(modules.iter().enumerate());
    let finished = Mutex::new(Vec::with_capacity(modules.len()));

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                loop {
                    let next = queue.lock().next();
                    let Some((index, module)) = next else {
                        break;
                    };
                    let outcome = deploy_module(module.as_ref(), options, trace);
                    finished.lock().push((index, outcome));
                }
            });
        }
    });

    let mut finished = finished.into_inner();
    finished.sort_by_key(|(index, _)| *index);
    DeployReport {
        modules: finished.into_iter().map(|(_, outcome)| outcome).collect(),
    }
}
