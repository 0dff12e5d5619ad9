//! # Media Contracts Module
//!
//! Leaf crate with the contracts every storage backend must satisfy to
//! participate in the catalog.
//!
//! ## Overview
//!
//! This crate defines:
//! - The `StorageProvider` capability interface (list, download, stream,
//!   delete, connectivity probe)
//! - The `HttpClient` abstraction used by cloud backends and the OAuth
//!   token manager, so network I/O stays mockable in tests
//! - `ProviderError`, the shared error type for backend I/O failures

pub mod error;
pub mod http;
pub mod storage;

pub use error::{ProviderError, Result};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use storage::{FileInfo, StorageProvider};
