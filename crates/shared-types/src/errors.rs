//! # Error Types
//!
//! Errors shared across components.

use thiserror::Error;

/// A status string that does not name a known `ContainerStatus`.
///
/// Callers recover from this locally (falling back to the current status);
/// it never aborts a workflow on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown container status: {value:?}")]
pub struct StatusParseError {
    pub value: String,
}
