//! Layered application configuration.
//!
//! Precedence, lowest first: built-in defaults, the optional config file,
//! `MIRRORSYNC_*` environment variables, command-line overrides.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use mirrorsync_core::{SyncError, SyncSettings};
use serde::Deserialize;

/// Environment variable prefix (`MIRRORSYNC_CACHE_ROOT`, `MIRRORSYNC_JOBS`, ...).
pub const ENV_PREFIX: &str = "MIRRORSYNC";

/// Settings read from file and environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Root of the mirror cache; caching is off without it.
    #[serde(default)]
    pub cache_root: Option<PathBuf>,

    /// The `git` executable.
    #[serde(default)]
    pub git_binary: Option<PathBuf>,

    /// Concurrent deploy workers.
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

fn default_jobs() -> usize {
    1
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_root: None,
            git_binary: None,
            jobs: default_jobs(),
        }
    }
}

impl AppConfig {
    /// Loads defaults, then `file` (format taken from its extension), then
    /// the environment.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().set_default("jobs", default_jobs() as i64)?;

        if let Some(file) = file {
            builder = builder.add_source(File::from(file).required(true));
        }

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    /// Applies command-line overrides.
    pub fn with_overrides(mut self, cache_root: Option<PathBuf>, jobs: Option<usize>) -> Self {
        if cache_root.is_some() {
            self.cache_root = cache_root;
        }
        if let Some(jobs) = jobs {
            self.jobs = jobs;
        }
        self
    }

    /// Engine settings for a registry.
    pub fn sync_settings(&self) -> Result<SyncSettings, SyncError> {
        let mut builder = SyncSettings::builder();
        if let Some(root) = &self.cache_root {
            builder = builder.cache_root(root);
        }
        if let Some(git) = &self.git_binary {
            builder = builder.git_binary(git);
        }
        builder.build()
    }

    /// Worker count, never zero.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.max(1)
    }
}
