//! Store errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by store adapters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("Store I/O error: {message}")]
    Io { message: String },

    /// A record could not be encoded or decoded.
    #[error("Store serialization error: {message}")]
    Serialization { message: String },

    /// The backing file exists but is not a valid snapshot.
    #[error("Corrupt store file {path:?}: {message}")]
    Corrupt { path: PathBuf, message: String },
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
