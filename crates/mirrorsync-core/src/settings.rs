//! Engine settings.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Settings shared by every synchronizer of one registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SyncSettings {
    /// Directory holding one bare mirror per remote. Without it nothing is cached.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache_root: Option<PathBuf>,

    /// The `git` executable to invoke.
    #[serde(default = "default_git_binary")]
    git_binary: PathBuf,
}

fn default_git_binary() -> PathBuf {
    PathBuf::from("git")
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            cache_root: None,
            git_binary: default_git_binary(),
        }
    }
}

impl SyncSettings {
    /// Creates a new builder for SyncSettings.
    pub fn builder() -> SyncSettingsBuilder {
        SyncSettingsBuilder::default()
    }

    /// Returns the cache root, if caching is enabled.
    pub fn cache_root(&self) -> Option<&Path> {
        self.cache_root.as_deref()
    }

    /// Returns the `git` executable.
    pub fn git_binary(&self) -> &Path {
        &self.git_binary
    }

    /// Checks that the settings are usable.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfig`] for an empty git binary or cache root.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.git_binary.as_os_str().is_empty() {
            return Err(SyncError::invalid_config("git_binary cannot be empty"));
        }
        if let Some(root) = &self.cache_root
            && root.as_os_str().is_empty()
        {
            return Err(SyncError::invalid_config("cache_root cannot be empty"));
        }
        Ok(())
    }
}

/// Builder for SyncSettings.
#[derive(Debug, Default)]
pub struct SyncSettingsBuilder {
    cache_root: Option<PathBuf>,
    git_binary: Option<PathBuf>,
}

impl SyncSettingsBuilder {
    /// Sets the cache root.
    pub fn cache_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(path.into());
        self
    }

    /// Sets the git executable.
    pub fn git_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.git_binary = Some(path.into());
        self
    }

    /// Builds and validates the settings.
    pub fn build(self) -> Result<SyncSettings, SyncError> {
        let settings = SyncSettings {
            cache_root: self.cache_root,
            git_binary: self.git_binary.unwrap_or_else(default_git_binary),
        };
        settings.validate()?;
        Ok(settings)
    }
}
