//! Mirror freshness tracking.

use std::fmt;
use std::time::Instant;

/// Presence and freshness of a remote's cache mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MirrorState {
    /// No mirror on disk (or no cache root configured).
    Absent,
    /// A mirror exists but has not been refreshed by this synchronizer yet.
    Stale,
    /// Refreshed during this synchronizer's lifetime.
    Fresh,
}

impl fmt::Display for MirrorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Absent => "absent",
            Self::Stale => "stale",
            Self::Fresh => "fresh",
        };
        f.write_str(name)
    }
}

/// Refresh bookkeeping for one synchronizer.
///
/// Only [`RefreshState::record_success`] makes a mirror [`MirrorState::Fresh`];
/// failures are counted but never change freshness.
#[derive(Debug, Default)]
pub struct RefreshState {
    fresh: bool,
    refresh_count: u32,
    last_refresh: Option<Instant>,
    last_error: Option<String>,
    failure_count: u32,
}

impl RefreshState {
    /// Creates a state that has never refreshed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the mirror state from freshness and on-disk presence.
    pub fn state(&self, present: bool) -> MirrorState {
        if self.fresh {
            MirrorState::Fresh
        } else if present {
            MirrorState::Stale
        } else {
            MirrorState::Absent
        }
    }

    /// Returns true if a refresh must run.
    pub fn needs_refresh(&self, force: bool) -> bool {
        force || !self.fresh
    }

    /// Records a successful refresh.
    pub fn record_success(&mut self) {
        self.fresh = true;
        self.refresh_count += 1;
        self.last_refresh = Some(Instant::now());
        self.last_error = None;
        self.failure_count = 0;
    }

    /// Records a failed refresh.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
        self.failure_count += 1;
    }

    /// Number of successful refreshes.
    pub fn refresh_count(&self) -> u32 {
        self.refresh_count
    }

    /// Time of the last successful refresh.
    pub fn last_refresh(&self) -> Option<Instant> {
        self.last_refresh
    }

    /// Message of the last failed refresh, cleared by a success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Consecutive failures since the last success.
    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }
}
