//! Error types for the Sync Coordinator.

use bt_01_container_store::StoreError;
use bt_02_outbox::OutboxError;
use bt_03_field_resolution::ResolutionError;
use bt_04_container_lifecycle::LifecycleError;
use bt_05_route_completion::CompletionError;
use thiserror::Error;

/// Failure reported by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// 404-equivalent.
    #[error("Remote resource not found: {resource}")]
    NotFound { resource: String },

    /// The server answered with an error status.
    #[error("Remote error {code}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { code: u16, message: Option<String> },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Remote call timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },
}

impl RemoteError {
    /// Label for the fallback metric.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Status { .. } => "remote_error",
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// The only error a public coordinator operation returns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Outbox(#[from] OutboxError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// Read-only remote operations that have no offline fallback.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Operation requires connectivity")]
    Offline,

    #[error("Container not found: {uid}")]
    ContainerNotFound { uid: String },

    #[error("No shipping verification in progress for route {route_id}")]
    NoVerificationSession { route_id: String },

    #[error("Route {route_id} still has {} unverified containers", .outstanding.len())]
    VerificationIncomplete {
        route_id: String,
        outstanding: Vec<String>,
    },

    #[error("Payload encoding failed: {0}")]
    Payload(String),
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Payload(err.to_string())
    }
}

impl SyncError {
    /// Short message for operators, keyed by error kind.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Store(_) => "Could not save on this device.",
            Self::Outbox(_) => "Could not save for later sync.",
            Self::Resolution(_) | Self::Payload(_) => "The update could not be prepared.",
            Self::Lifecycle(_) => "This basket cannot be used for that step.",
            Self::Completion(CompletionError::RouteNotFound { .. }) => "Route not found.",
            Self::Completion(CompletionError::UnknownProduct { .. }) => {
                "This product is not on the route."
            }
            Self::Completion(CompletionError::Store(_)) => "Could not save on this device.",
            Self::Remote(e) if e.is_not_found() => "Not found on the server.",
            Self::Remote(_) => "The server could not be reached.",
            Self::Offline => "You are offline.",
            Self::ContainerNotFound { .. } => "Basket not found.",
            Self::NoVerificationSession { .. } => "Start scanning before submitting.",
            Self::VerificationIncomplete { .. } => "Some baskets are not verified yet.",
        }
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
