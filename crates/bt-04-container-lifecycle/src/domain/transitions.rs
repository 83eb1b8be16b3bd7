//! Status transitions.

use super::errors::LifecycleError;
use serde::{Deserialize, Serialize};
use shared_types::ContainerStatus;
use std::fmt;

/// A workflow that can act on a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workflow {
    Production,
    Receiving,
    InventoryCount,
    Loading,
    ShippingVerification,
    Clear,
    Sampling,
}

impl Workflow {
    pub const ALL: [Workflow; 7] = [
        Workflow::Production,
        Workflow::Receiving,
        Workflow::InventoryCount,
        Workflow::Loading,
        Workflow::ShippingVerification,
        Workflow::Clear,
        Workflow::Sampling,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Receiving => "receiving",
            Self::InventoryCount => "inventory_count",
            Self::Loading => "loading",
            Self::ShippingVerification => "shipping_verification",
            Self::Clear => "clear",
            Self::Sampling => "sampling",
        }
    }

    /// Statuses this workflow accepts. `None` means any.
    #[must_use]
    pub fn required(&self) -> Option<&'static [ContainerStatus]> {
        use ContainerStatus::*;
        match self {
            Self::Production | Self::InventoryCount | Self::Clear | Self::Sampling => None,
            Self::Receiving => Some(&[InProduction]),
            Self::Loading => Some(&[InStock]),
            Self::ShippingVerification => Some(&[Loading, Unassigned]),
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status a container ends in after `workflow` acts on it.
pub fn transition(
    workflow: Workflow,
    current: ContainerStatus,
) -> Result<ContainerStatus, LifecycleError> {
    if let Some(required) = workflow.required() {
        if !required.contains(&current) {
            return Err(LifecycleError::InvalidTransition { workflow, current });
        }
    }

    Ok(match workflow {
        Workflow::Production => ContainerStatus::InProduction,
        Workflow::Receiving => ContainerStatus::InStock,
        Workflow::InventoryCount => current,
        Workflow::Loading => ContainerStatus::Loading,
        Workflow::ShippingVerification => ContainerStatus::Shipped,
        Workflow::Clear => ContainerStatus::Unassigned,
        Workflow::Sampling => ContainerStatus::Sampling,
    })
}
