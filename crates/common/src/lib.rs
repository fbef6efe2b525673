//! Photobooth Common Utilities
//!
//! Shared infrastructure for all Photobooth crates:
//! - Error taxonomy and result aliases
//! - Wall-clock access for date stamps and file names
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
