//! # Picker Provider Module
//!
//! Cloud media access through the remote picker protocol.
//!
//! ## Overview
//!
//! Picker-based providers never see the user's whole cloud library. The user
//! opens a picker UI upstream, selects items, and only that selection becomes
//! visible here:
//!
//! 1. `PickerSessionService::start_session` creates a session and stores its
//!    picker URI for the user to open
//! 2. `poll_session` is called until the selection is committed
//! 3. `PickerConnector` exposes the committed selection through the standard
//!    `StorageProvider` trait

pub mod connector;
pub mod error;
pub mod session;
pub mod types;

pub use connector::PickerConnector;
pub use error::{PickerError, Result};
pub use session::PickerSessionService;
pub use types::{
    CreateSessionRequest, MediaFile, MediaItemsResponse, PickedMediaItem, PickingConfig,
    PickingSession,
};
