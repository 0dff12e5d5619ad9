//! Repository traits and SQLite implementations

pub mod album;
pub mod guest_link;
pub mod media;
pub mod picker_session;
pub mod provider_config;

pub use album::{AlbumRepository, SqliteAlbumRepository};
pub use guest_link::{GuestLinkRepository, SqliteGuestLinkRepository};
pub use media::{
    AssetFinalization, MediaRepository, NewPlaceholder, PlaceholderOutcome, SqliteMediaRepository,
};
pub use picker_session::{PickerSessionRepository, SqlitePickerSessionRepository};
pub use provider_config::{ProviderConfigRepository, SqliteProviderConfigRepository};
