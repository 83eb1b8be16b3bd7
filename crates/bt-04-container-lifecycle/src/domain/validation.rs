//! Scan validators for the receiving, inventory and loading workflows.
//!
//! Each takes the scanned uid and the record found for it (if any) and
//! returns a closed `ScanValidation` outcome.

use super::transitions::{transition, Workflow};
use shared_types::{Container, ContainerStatus};

/// Outcome of validating one scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanValidation {
    Valid(Container),
    /// No local or remote record for the uid.
    NotRegistered(String),
    /// Current status forbids the workflow.
    InvalidStatus {
        container: Container,
        current: ContainerStatus,
    },
    /// Container belongs to another warehouse.
    WrongWarehouse {
        container: Container,
        expected: String,
    },
    /// Inventory count found a uid with no record.
    NotInWarehouse(String),
    Error(String),
}

impl ScanValidation {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Valid(_) => "valid",
            Self::NotRegistered(_) => "not_registered",
            Self::InvalidStatus { .. } => "invalid_status",
            Self::WrongWarehouse { .. } => "wrong_warehouse",
            Self::NotInWarehouse(_) => "not_in_warehouse",
            Self::Error(_) => "error",
        }
    }

    /// The uid the outcome is about.
    pub fn uid(&self) -> &str {
        match self {
            Self::Valid(c)
            | Self::InvalidStatus { container: c, .. }
            | Self::WrongWarehouse { container: c, .. } => &c.uid,
            Self::NotRegistered(uid) | Self::NotInWarehouse(uid) => uid,
            Self::Error(_) => "",
        }
    }
}

/// Receiving accepts only `IN_PRODUCTION` containers.
pub fn validate_receiving(uid: &str, found: Option<Container>) -> ScanValidation {
    let Some(container) = found else {
        return ScanValidation::NotRegistered(uid.to_string());
    };
    check_status(Workflow::Receiving, container)
}

/// Inventory count against `expected_warehouse`.
///
/// A container with no warehouse is accepted and adopted by the caller.
pub fn validate_inventory(
    uid: &str,
    found: Option<Container>,
    expected_warehouse: &str,
) -> ScanValidation {
    let Some(container) = found else {
        return ScanValidation::NotInWarehouse(uid.to_string());
    };

    match container.warehouse_id.as_deref() {
        None | Some("") => ScanValidation::Valid(container),
        Some(w) if w == expected_warehouse => ScanValidation::Valid(container),
        Some(_) => ScanValidation::WrongWarehouse {
            container,
            expected: expected_warehouse.to_string(),
        },
    }
}

/// Loading accepts `IN_STOCK` containers from `source_warehouse`.
pub fn validate_loading(
    uid: &str,
    found: Option<Container>,
    source_warehouse: &str,
) -> ScanValidation {
    let Some(container) = found else {
        return ScanValidation::NotRegistered(uid.to_string());
    };

    match check_status(Workflow::Loading, container) {
        ScanValidation::Valid(container) if !container.is_in_warehouse(source_warehouse) => {
            ScanValidation::WrongWarehouse {
                container,
                expected: source_warehouse.to_string(),
            }
        }
        other => other,
    }
}

fn check_status(workflow: Workflow, container: Container) -> ScanValidation {
    match transition(workflow, container.status) {
        Ok(_) => ScanValidation::Valid(container),
        Err(_) => {
            let current = container.status;
            ScanValidation::InvalidStatus { container, current }
        }
    }
}
