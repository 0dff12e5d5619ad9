//! # Runtime Module
//!
//! Process-wide infrastructure shared by every other crate in the workspace.
//!
//! ## Overview
//!
//! Currently this is the logging/tracing bootstrap: a `LoggingConfig` builder
//! over `tracing-subscriber` with pretty, compact, and JSON output formats
//! and module-level filtering.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
pub use logging::{init_logging, LogFormat, LoggingConfig};
