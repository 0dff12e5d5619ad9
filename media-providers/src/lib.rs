//! # Storage Providers Module
//!
//! Concrete storage backends and the factory that builds them from
//! persisted configuration.
//!
//! ## Overview
//!
//! - `ReqwestHttpClient`: the production `HttpClient` implementation
//! - `LocalProvider`: filesystem-backed storage under a root directory
//! - `ProviderFactory`: builds and caches providers per configuration row

pub mod factory;
pub mod http;
pub mod local;

pub use factory::ProviderFactory;
pub use http::ReqwestHttpClient;
pub use local::LocalProvider;
