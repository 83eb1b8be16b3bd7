use std::path::PathBuf;
use thiserror::Error;

/// Outbox errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutboxError {
    #[error("Outbox I/O error: {message}")]
    Io { message: String },

    #[error("Outbox serialization error: {message}")]
    Serialization { message: String },

    /// A complete (newline-terminated) log line failed to parse.
    #[error("Corrupt outbox log {path:?} at line {line}: {message}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

impl From<std::io::Error> for OutboxError {
    fn from(err: std::io::Error) -> Self {
        OutboxError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for OutboxError {
    fn from(err: serde_json::Error) -> Self {
        OutboxError::Serialization {
            message: err.to_string(),
        }
    }
}

pub type OutboxResult<T> = Result<T, OutboxError>;
