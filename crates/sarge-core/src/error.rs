//! Error types for the Sarge launcher.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or saving persisted documents.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No platform data directory could be resolved.
    #[error("Data directory not found")]
    NoDataDir,

    /// Reading or writing the backing file failed.
    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document could not be encoded.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform has no config directory (e.g. `$HOME` unset).
    #[error("Config directory not found")]
    NoConfigDir,

    /// An application data list name that is not one of the four lists.
    #[error("Unknown list: {0}")]
    UnknownList(String),
}
