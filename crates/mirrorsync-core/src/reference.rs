//! Revision references and resolved commit ids.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// A caller-supplied revision expression (branch, tag, or commit-ish).
///
/// The expression is passed to `git` verbatim, so anything `rev-parse`
/// understands is accepted (`main`, `v1.2.0`, `HEAD~2`, an abbreviated sha).
/// Input that git would misread is rejected up front.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Reference(String);

impl Reference {
    /// Parses and validates a revision expression.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidReference`] when the input is empty, starts
    /// with `-`, or contains control characters. Inner spaces are kept, so
    /// expressions such as `main@{1 day ago}` or `:/fix typo` pass through.
    pub fn parse(input: &str) -> Result<Self, SyncError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(SyncError::invalid_reference(input, "reference cannot be empty"));
        }

        // git would read it as an option
        if trimmed.starts_with('-') {
            return Err(SyncError::invalid_reference(
                input,
                "reference cannot start with '-'",
            ));
        }

        if trimmed.chars().any(char::is_control) {
            return Err(SyncError::invalid_reference(
                input,
                "reference contains control characters",
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Returns the expression as given.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the expression is a full object name.
    pub fn is_commit_id(&self) -> bool {
        CommitId::is_object_name(&self.0)
    }

    /// Expression that peels the reference to a commit, rejecting trees and blobs.
    ///
    /// A `:/<text>` message search already names a commit and takes the rest
    /// of the string as its pattern, so it is returned unchanged.
    pub fn peeled(&self) -> String {
        if self.0.starts_with(":/") {
            self.0.clone()
        } else {
            format!("{}^{{commit}}", self.0)
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Reference {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Reference {
    type Error = SyncError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Reference {
    type Error = SyncError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Reference> for String {
    fn from(reference: Reference) -> Self {
        reference.0
    }
}

/// An immutable commit object name (SHA-1 or SHA-256, full length, lowercase).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitId(String);

impl CommitId {
    /// Parses `rev-parse` output into a commit id.
    ///
    /// Surrounding whitespace, including the trailing newline, is ignored.
    pub fn parse(output: &str) -> Result<Self, SyncError> {
        let trimmed = output.trim();
        if Self::is_object_name(trimmed) {
            Ok(Self(trimmed.to_ascii_lowercase()))
        } else {
            Err(SyncError::InvalidCommit {
                output: trimmed.to_string(),
            })
        }
    }

    fn is_object_name(s: &str) -> bool {
        (s.len() == 40 || s.len() == 64) && s.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Returns the full hex name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the abbreviated form used in log lines.
    pub fn short(&self) -> &str {
        &self.0[..8]
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CommitId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
