//! Error types for the list core.
//!
//! Windowing and click handling themselves cannot fail; these cover
//! construction and the I/O edges around them.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ListError {
    /// A scroller was built with a zero row height.
    #[error("Row height must be positive")]
    ZeroRowHeight,

    /// A tokio scheduler was requested outside a runtime.
    #[error("No tokio runtime available: {0}")]
    RuntimeUnavailable(String),

    /// The list settings file exists but could not be read.
    #[error("Failed to read settings {path:?}: {message}")]
    Settings { path: PathBuf, message: String },

    /// A replay trace could not be loaded.
    #[error("Invalid trace: {0}")]
    Trace(String),
}
