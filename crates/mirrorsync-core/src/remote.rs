//! Remote repository identities.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Character substituted for anything unsafe in a mirror directory name.
pub const PLACEHOLDER: char = '-';

/// A string naming a remote repository (URL or filesystem path).
///
/// Equality is plain string equality: `https://host/repo` and
/// `https://host/repo/` are two different remotes with two different
/// mirrors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(String);

impl RemoteId {
    /// Wraps a remote location.
    pub fn new(remote: impl Into<String>) -> Self {
        Self(remote.into())
    }

    /// Returns the remote as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns a filesystem-safe directory name derived from the remote.
    ///
    /// ASCII alphanumerics, `@`, `.` and `-` are kept; every other character
    /// becomes [`PLACEHOLDER`].
    pub fn sanitized(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '-') {
                    c
                } else {
                    PLACEHOLDER
                }
            })
            .collect()
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RemoteId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for RemoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for RemoteId {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl AsRef<str> for RemoteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for RemoteId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
