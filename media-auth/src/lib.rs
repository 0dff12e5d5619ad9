//! # Authentication Module
//!
//! OAuth 2.0 credential management for cloud storage providers.
//!
//! ## Overview
//!
//! This module manages:
//! - Credential blobs stored inside provider configuration rows
//! - Automatic access token refresh with a per-provider lock
//! - Scope validation with upstream revocation of incomplete grants

pub mod credentials;
pub mod error;
pub mod manager;

pub use credentials::CloudCredentials;
pub use error::{AuthError, Result};
pub use manager::{
    required_scopes, OAuthEndpoints, TokenManager, TokenState, PICKER_READONLY_SCOPE,
};
