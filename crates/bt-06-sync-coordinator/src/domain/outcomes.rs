use bt_02_outbox::Uuid;
use bt_03_field_resolution::ResolutionWarning;
use bt_04_container_lifecycle::{ScanValidation, ShippingScan};
use bt_05_route_completion::CompletionOutcome;
use shared_types::Container;

use crate::error::RemoteError;

/// How a remote write was delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncPath {
    /// The remote call succeeded.
    Online,
    /// Deferred to the outbox. `remote_error` is `None` when offline.
    Queued {
        operation_id: Uuid,
        remote_error: Option<RemoteError>,
    },
}

impl SyncPath {
    #[must_use]
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued { .. })
    }
}

/// Result of a multi-container update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkUpdateReport {
    /// `None` if nothing was left to send.
    pub path: Option<SyncPath>,
    /// Records as persisted.
    pub updated: Vec<Container>,
    /// Uids with no local record; skipped, the rest proceeded.
    pub skipped: Vec<String>,
    /// Scans that failed validation before the update.
    pub rejected: Vec<ScanValidation>,
    pub warnings: Vec<ResolutionWarning>,
}

impl BulkUpdateReport {
    pub fn updated_uids(&self) -> Vec<String> {
        self.updated.iter().map(|c| c.uid.clone()).collect()
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty() || !self.rejected.is_empty()
    }
}

/// Result of a receiving or inventory scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// `path` is `None` when the scan needed no write (inventory match).
    Accepted {
        container: Container,
        path: Option<SyncPath>,
    },
    Rejected(ScanValidation),
    /// Repeat read inside the debounce window.
    Debounced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadingScanOutcome {
    Accepted {
        container: Container,
        completion: CompletionOutcome,
    },
    Rejected(ScanValidation),
    Debounced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShippingScanOutcome {
    Scanned(ShippingScan),
    Debounced,
}

/// Result of a submitted shipping verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingReport {
    pub path: SyncPath,
    /// Containers now SHIPPED.
    pub shipped: Vec<Container>,
    /// Route after being marked VERIFIED.
    pub completion: CompletionOutcome,
}

/// Whether deleting a container also retracts it server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeleteScope {
    /// Remove the local record only.
    #[default]
    LocalOnly,
    /// Delete on the server too (queued when offline).
    Remote,
}
