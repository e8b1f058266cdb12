//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mirrorsync_core::{ExecutionFailure, SyncError};
use parking_lot::Mutex;

use crate::cache::MirrorInspector;
use crate::command::{CommandOutput, GitInvocation, GitRunner};

/// Commit every `rev-parse` resolves to unless told otherwise.
pub(crate) const COMMIT: &str = "0123456789abcdef0123456789abcdef01234567";

/// Mirror presence kept in a set instead of on disk.
#[derive(Debug, Default)]
pub(crate) struct MemoryInspector {
    present: Mutex<HashSet<PathBuf>>,
}

impl MemoryInspector {
    pub(crate) fn insert(&self, path: impl Into<PathBuf>) {
        self.present.lock().insert(path.into());
    }
}

impl MirrorInspector for MemoryInspector {
    fn is_present(&self, path: &Path) -> bool {
        self.present.lock().contains(path)
    }
}

/// Records every invocation and answers with canned output.
///
/// A `clone --mirror` marks its target as present in the shared inspector so
/// freshness logic behaves as it would on disk.
#[derive(Debug)]
pub(crate) struct RecordingRunner {
    calls: Mutex<Vec<GitInvocation>>,
    responses: Mutex<HashMap<String, String>>,
    failures: Mutex<HashMap<String, i32>>,
    inspector: Arc<MemoryInspector>,
}

impl RecordingRunner {
    pub(crate) fn new(inspector: Arc<MemoryInspector>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responses: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            inspector,
        }
    }

    /// Canned stdout for a subcommand.
    pub(crate) fn respond(&self, subcommand: &str, stdout: &str) {
        self.responses
            .lock()
            .insert(subcommand.to_string(), stdout.to_string());
    }

    /// Makes a subcommand exit with `code`.
    pub(crate) fn fail_on(&self, subcommand: &str, code: i32) {
        self.failures.lock().insert(subcommand.to_string(), code);
    }

    pub(crate) fn calls(&self) -> Vec<GitInvocation> {
        self.calls.lock().clone()
    }

    /// Subcommand names in call order.
    pub(crate) fn subcommands(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| c.subcommand())
            .map(|s| s.to_string_lossy().into_owned())
            .collect()
    }

    pub(crate) fn count(&self, subcommand: &str) -> usize {
        self.subcommands().iter().filter(|s| *s == subcommand).count()
    }
}

impl GitRunner for RecordingRunner {
    fn run(&self, invocation: &GitInvocation) -> Result<CommandOutput, SyncError> {
        self.calls.lock().push(invocation.clone());

        let subcommand = invocation
            .subcommand()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        if let Some(code) = self.failures.lock().get(&subcommand) {
            return Err(ExecutionFailure::new(invocation.display(Path::new("git")), Some(*code))
                .with_stderr(format!("fatal: {} failed\n", subcommand))
                .into());
        }

        if subcommand == "clone"
            && invocation.args().iter().any(|a| a == "--mirror")
            && let Some(target) = invocation.args().last()
        {
            self.inspector.insert(PathBuf::from(target));
        }

        let stdout = match self.responses.lock().get(&subcommand) {
            Some(stdout) => stdout.clone(),
            None if subcommand == "rev-parse" => format!("{}\n", COMMIT),
            None => String::new(),
        };
        Ok(CommandOutput::success(stdout))
    }
}
