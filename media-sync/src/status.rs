//! Sync run state and reports

use chrono::{DateTime, Utc};
use std::fmt;

/// Lifecycle state of sync for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No run in flight
    Idle,
    /// A run is importing
    Running,
    /// A run was asked to stop and is winding down
    Cancelling,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SyncState::Idle => "idle",
            SyncState::Running => "running",
            SyncState::Cancelling => "cancelling",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of one completed sync run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub provider_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// New assets imported this run
    pub imported: usize,
    /// Items that resolved to an already-imported asset
    pub duplicates: usize,
    pub failed: usize,
    /// Human-readable per-item failure messages
    pub failures: Vec<String>,
    /// Whether the run stopped early on a cancel request
    pub cancelled: bool,
}

impl SyncReport {
    pub(crate) fn new(provider_id: &str) -> Self {
        let now = Utc::now();
        Self {
            provider_id: provider_id.to_string(),
            started_at: now,
            finished_at: now,
            imported: 0,
            duplicates: 0,
            failed: 0,
            failures: Vec::new(),
            cancelled: false,
        }
    }
}

/// Point-in-time view of sync for one provider.
#[derive(Debug, Clone)]
pub struct SyncStatus {
    pub provider_id: String,
    pub state: SyncState,
    pub last_report: Option<SyncReport>,
}
