//! # mirrorsync git engine
//!
//! Keeps one bare mirror per remote repository under a cache root and
//! materializes working directories from it at caller-chosen revisions.
//!
//! ## Features
//!
//! - Git operations via the system `git` CLI, with explicit `--git-dir` /
//!   `--work-tree` on every call
//! - One [`Synchronizer`] per remote, handed out by a [`SynchronizerRegistry`]
//! - Mirror refreshed at most once per synchronizer unless forced
//! - References resolved to a concrete commit before every hard reset
//!
//! ## Example
//!
//! ```no_run
//! use mirrorsync_core::{Reference, SyncSettings};
//! use mirrorsync_git::{SyncOptions, SynchronizerRegistry};
//!
//! let settings = SyncSettings::builder()
//!     .cache_root("/var/cache/mirrorsync")
//!     .build()?;
//! let registry = SynchronizerRegistry::new(&settings);
//!
//! let synchronizer = registry.get_or_create("https://github.com/org/module.git");
//! let commit = synchronizer.sync(
//!     "/etc/puppet/modules/module",
//!     &Reference::parse("production")?,
//!     SyncOptions::default(),
//! )?;
//! println!("now at {}", commit);
//! # Ok::<(), mirrorsync_core::SyncError>(())
//! ```

pub mod cache;
pub mod command;
pub mod registry;
pub mod synchronizer;
pub mod worktree;

#[cfg(test)]
mod testing;

// Re-exports
pub use cache::{CacheStore, FsInspector, MirrorInspector, MirrorState, RefreshState};
pub use command::{CommandOutput, GitInvocation, GitRunner, ShellGit};
pub use registry::SynchronizerRegistry;
pub use synchronizer::{CacheOptions, SyncOptions, Synchronizer};
pub use worktree::WorkingDir;

// Re-export mirrorsync_core for consumers
pub use mirrorsync_core;
