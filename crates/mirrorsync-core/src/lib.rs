//! # mirrorsync core
//!
//! Domain types shared by the mirrorsync crates: remote identities,
//! revision references, resolved commit ids, engine settings and the error
//! taxonomy.

pub mod error;
pub mod reference;
pub mod remote;
pub mod settings;

pub use error::{ExecutionFailure, Result, SyncError};
pub use reference::{CommitId, Reference};
pub use remote::RemoteId;
pub use settings::{SyncSettings, SyncSettingsBuilder};

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
