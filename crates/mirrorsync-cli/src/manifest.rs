//! Deploy manifests: which module goes where, at which revision.
//!
//! ```yaml
//! basedir: /etc/puppetlabs/code/modules   # optional
//! modules:
//!   - name: apache
//!     remote: https://github.com/puppetlabs/puppetlabs-apache.git
//!     ref: v12.1.0
//!   - name: site
//!     remote: git@git.example.com:ops/site.git
//!     ref: production
//!     path: ../site                        # relative to basedir
//! ```

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use mirrorsync_core::{Reference, RemoteId};
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The file could not be read.
    #[error("cannot read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not a valid manifest document.
    #[error("cannot parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The manifest parsed but is inconsistent.
    #[error("invalid manifest: {0}")]
    Invalid(String),
}

/// A module entry as written in the manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleSpec {
    /// Module name, also the default directory name.
    pub name: String,
    /// Where to fetch it from.
    pub remote: RemoteId,
    /// Revision to deploy.
    #[serde(rename = "ref")]
    pub reference: Reference,
    /// Target directory, relative to the base directory when not absolute.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Parsed manifest document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Base for relative module paths. Defaults to the manifest's directory.
    #[serde(default)]
    pub basedir: Option<PathBuf>,
    /// Modules in deploy order.
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

/// A module with its target directory worked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    pub name: String,
    pub remote: RemoteId,
    pub reference: Reference,
    pub full_path: PathBuf,
}

impl Manifest {
    /// Parses YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Reads and resolves the manifest at `path`.
    pub fn load(path: &Path) -> Result<Vec<ResolvedModule>, ManifestError> {
        let text = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::from_yaml(&text).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let manifest_dir = path.parent().unwrap_or_else(|| Path::new("."));
        manifest.resolve(manifest_dir)
    }

    /// Computes each module's directory and checks the manifest for
    /// duplicate names or target paths.
    pub fn resolve(&self, manifest_dir: &Path) -> Result<Vec<ResolvedModule>, ManifestError> {
        let basedir = match &self.basedir {
            Some(dir) => manifest_dir.join(dir),
            None => manifest_dir.to_path_buf(),
        };

        let mut names = HashSet::new();
        let mut paths = HashSet::new();
        let mut resolved = Vec::with_capacity(self.modules.len());

        for module in &self.modules {
            let name = module.name.trim();
            if name.is_empty() {
                return Err(ManifestError::Invalid("module name cannot be empty".into()));
            }
            if !names.insert(name.to_string()) {
                return Err(ManifestError::Invalid(format!(
                    "module '{}' is listed twice",
                    name
                )));
            }

            let full_path = match &module.path {
                Some(path) => basedir.join(path),
                None => basedir.join(name),
            };
            let full_path = normalize(&full_path);
            if !paths.insert(full_path.clone()) {
                return Err(ManifestError::Invalid(format!(
                    "module '{}' targets {} which another module already uses",
                    name,
                    full_path.display()
                )));
            }

            resolved.push(ResolvedModule {
                name: name.to_string(),
                remote: module.remote.clone(),
                reference: module.reference.clone(),
                full_path,
            });
        }

        Ok(resolved)
    }
}

/// Lexically removes `.` and `..` components so equal targets compare equal.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            },
            other => out.push(other),
        }
    }
    out
}
