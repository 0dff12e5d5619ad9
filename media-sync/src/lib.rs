//! # Sync Module
//!
//! Poll-based synchronization between remote storage providers and the local
//! catalog.
//!
//! ## Overview
//!
//! - [`SyncOrchestrator`]: one-per-provider sync runs with cooperative
//!   cancellation and background execution
//! - [`SyncReport`]: counts and failures from a completed run
//! - [`SyncStatus`]: non-blocking state view (`idle`, `running`,
//!   `cancelling`) plus the last report
//!
//! Sync reuses the import pipeline for every item, so deduplication and
//! compensation behave exactly as they do for manual imports. Cancellation
//! is cooperative: the run checks its token between items and an in-flight
//! item always completes or unwinds fully.

pub mod error;
pub mod orchestrator;
pub mod status;

pub use error::{Result, SyncError};
pub use orchestrator::SyncOrchestrator;
pub use status::{SyncReport, SyncState, SyncStatus};
