//! # Media Ingest Module
//!
//! Everything that moves bytes into the library: the import pipeline, bulk
//! operations, and guest uploads.
//!
//! ## Overview
//!
//! - [`MediaImportPipeline`]: imports one file as a compensated five step
//!   saga (placeholder, normalize, store, thumbnail, finalize)
//! - [`BulkOperationCoordinator`]: multi-item deletes with a failure circuit
//!   breaker, and batch imports with independent per-item failures
//! - [`GuestUploadService`]: quota-gated uploads through guest links
//! - [`MediaLibrary`]: the on-disk layout originals and thumbnails live in
//!
//! ## Failure model
//!
//! Imports either complete fully or leave nothing behind; the compensation
//! stack in [`saga`] unwinds partial state. The only tolerated partial
//! outcome is a missing thumbnail. Deletes are atomic per item: catalog rows
//! only commit once the library file is gone.

pub mod bulk;
pub mod config;
pub mod error;
pub mod guest;
pub mod imaging;
pub mod library;
pub mod pipeline;
pub mod saga;

pub use bulk::{BulkFailure, BulkOperationCoordinator, BulkOutcome, DELETE_FAILURE_LIMIT};
pub use config::ImportConfig;
pub use error::{IngestError, Result};
pub use guest::{GuestQuotaGate, GuestUpload, GuestUploadResult, GuestUploadService};
pub use library::MediaLibrary;
pub use pipeline::{ImportOptions, ImportOutcome, MediaImportPipeline, UPLOAD_PROVIDER_ID};
