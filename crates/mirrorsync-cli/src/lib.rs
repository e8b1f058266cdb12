//! # mirrorsync command line
//!
//! Front end over [`mirrorsync_git`]: layered configuration, YAML deploy
//! manifests, and a deploy runner that isolates module failures.

pub mod cli;
pub mod commands;
pub mod deploy;
pub mod manifest;
pub mod settings;

pub use cli::Cli;
pub use deploy::{DeployReport, Deployable, GitModule, ModuleOutcome, deploy_all, deploy_module};
pub use manifest::{Manifest, ManifestError, ResolvedModule};
pub use settings::AppConfig;
