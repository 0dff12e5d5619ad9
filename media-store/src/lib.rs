//! # Catalog Store Module
//!
//! Owns the canonical media catalog database and provides repository patterns
//! for data access.
//!
//! ## Overview
//!
//! This module manages:
//! - SQLite connection pooling and schema bootstrap
//! - Models for media assets, provider configurations, picker sessions,
//!   guest links, and album/tag memberships
//! - Repository traits with SQLite implementations
//!
//! ## Invariants
//!
//! - A media asset row with an empty `file_path` is an uncommitted
//!   placeholder; placeholders are never returned by the read APIs.
//! - `(provider_id, provider_file_id)` is the deduplication key, enforced by
//!   a unique constraint; the insert conflict is the authoritative dedup
//!   signal for the import pipeline.

pub mod db;
pub mod error;
pub mod models;
pub mod repositories;

pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{Result, StoreError};
pub use models::{
    Album, GuestLink, MediaAsset, MediaType, PickerSession, ProviderConfig, ProviderType,
};
pub use repositories::{
    AlbumRepository, AssetFinalization, GuestLinkRepository, MediaRepository, NewPlaceholder,
    PickerSessionRepository, PlaceholderOutcome, ProviderConfigRepository, SqliteAlbumRepository,
    SqliteGuestLinkRepository, SqliteMediaRepository, SqlitePickerSessionRepository,
    SqliteProviderConfigRepository,
};
