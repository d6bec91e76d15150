use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle of the background watcher process.
///
/// - `NotRunning`: no child process is tracked
/// - `Running`: a child was spawned and has not been asked to stop
/// - `Stopping`: a graceful signal was sent; a forced kill follows if the
///   child outlives the grace period
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WatcherState {
    NotRunning,
    Running,
    Stopping,
}

impl WatcherState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotRunning => "not_running",
            Self::Running => "running",
            Self::Stopping => "stopping",
        }
    }
}

/// Snapshot of the supervisor, safe to hand out.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WatcherStatus {
    pub state: WatcherState,
    pub pid: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
}

impl WatcherStatus {
    pub fn not_running() -> Self {
        Self {
            state: WatcherState::NotRunning,
            pid: None,
            started_at: None,
        }
    }
}
