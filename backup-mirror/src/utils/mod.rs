//! Utility modules for the backup mirror.

pub mod errors;
pub mod logger;

pub use errors::{MirrorError, Result};
