//! # Core Domain Entities
//!
//! Defines the entities every component of the basket pipeline agrees on.
//!
//! ## Clusters
//!
//! - **Containers**: `Container`, `ContainerStatus`
//! - **Routes**: `LoadingRoute`, `LoadingItem`, `ItemCompletion`, `RouteCompletion`, `RouteStatus`

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::errors::StatusParseError;
use crate::time::Timestamp;

// =============================================================================
// CLUSTER A: CONTAINERS
// =============================================================================

/// Lifecycle status of a physical container.
///
/// ```text
/// [UNASSIGNED] ──production──→ [IN_PRODUCTION] ──receiving──→ [IN_STOCK]
///      ↑                                                         │
///      │                                                      loading
///      │                                                         ↓
///      └───────────── clear (from any) ─────────── [SHIPPED] ←─ [LOADING]
///
/// [SAMPLING] is reachable from any state and left only by clear.
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[derive(Default)]
pub enum ContainerStatus {
    /// Registered but not committed to any batch.
    #[default]
    Unassigned,
    /// Filled on the production line.
    InProduction,
    /// Received into a warehouse.
    InStock,
    /// Loaded onto a delivery route.
    Loading,
    /// Verified as shipped.
    Shipped,
    /// Pulled for sampling; terminal until cleared.
    Sampling,
}

impl ContainerStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [ContainerStatus; 6] = [
        ContainerStatus::Unassigned,
        ContainerStatus::InProduction,
        ContainerStatus::InStock,
        ContainerStatus::Loading,
        ContainerStatus::Shipped,
        ContainerStatus::Sampling,
    ];

    /// Wire representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unassigned => "UNASSIGNED",
            Self::InProduction => "IN_PRODUCTION",
            Self::InStock => "IN_STOCK",
            Self::Loading => "LOADING",
            Self::Shipped => "SHIPPED",
            Self::Sampling => "SAMPLING",
        }
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContainerStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| StatusParseError {
                value: s.to_string(),
            })
    }
}

/// A physical reusable container ("basket").
///
/// `uid` is the hardware tag and the only identifier that is stable across
/// sessions. While a container is `LOADING`, `warehouse_id` holds the route id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    pub quantity: u32,
    pub status: ContainerStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_date: Option<String>,
    pub last_updated: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_by: Option<String>,
}

impl Container {
    /// A freshly registered container: unassigned, empty, nowhere.
    pub fn new(uid: impl Into<String>, now: Timestamp) -> Self {
        Self {
            uid: uid.into(),
            product_id: None,
            batch_id: None,
            warehouse_id: None,
            quantity: 0,
            status: ContainerStatus::Unassigned,
            production_date: None,
            expire_date: None,
            last_updated: now,
            update_by: None,
        }
    }

    pub fn with_status(mut self, status: ContainerStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_warehouse(mut self, warehouse_id: impl Into<String>) -> Self {
        self.warehouse_id = Some(warehouse_id.into());
        self
    }

    pub fn with_product(mut self, product_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// True if the container sits in `warehouse_id`.
    #[must_use]
    pub fn is_in_warehouse(&self, warehouse_id: &str) -> bool {
        self.warehouse_id.as_deref() == Some(warehouse_id)
    }
}

// =============================================================================
// CLUSTER B: LOADING ROUTES
// =============================================================================

/// Overall status of a delivery route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[derive(Default)]
pub enum RouteStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    /// Set only by a successful shipping verification.
    Verified,
}

impl RouteStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Verified => "VERIFIED",
        }
    }
}

impl fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-item scan progress.
///
/// Full baskets and loose quantity are tracked independently because a
/// product can be fulfilled partly in whole containers and partly loose.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCompletion {
    pub full_baskets_completed: bool,
    pub loose_items_completed: bool,
    pub full_baskets_scanned: u32,
    pub loose_scanned: u32,
    /// Operator confirmed the full-basket count by hand.
    pub full_baskets_confirmed: bool,
    /// Containers that contributed to either mode. Ordered for stable output.
    pub contributing_uids: BTreeSet<String>,
}

impl ItemCompletion {
    /// True once any scan or confirmation touched this item.
    #[must_use]
    pub fn has_activity(&self) -> bool {
        self.full_baskets_scanned > 0
            || self.loose_scanned > 0
            || self.full_baskets_confirmed
            || !self.contributing_uids.is_empty()
    }
}

/// One expected product line on a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingItem {
    pub product_id: String,
    pub expected_full_baskets: u32,
    pub expected_loose_quantity: u32,
    #[serde(default)]
    pub completion: ItemCompletion,
}

impl LoadingItem {
    pub fn new(
        product_id: impl Into<String>,
        expected_full_baskets: u32,
        expected_loose_quantity: u32,
    ) -> Self {
        Self {
            product_id: product_id.into(),
            expected_full_baskets,
            expected_loose_quantity,
            completion: ItemCompletion::default(),
        }
    }

    /// Full baskets still needed before the full-basket mode is satisfied.
    #[must_use]
    pub fn remaining_full_baskets(&self) -> u32 {
        self.expected_full_baskets
            .saturating_sub(self.completion.full_baskets_scanned)
    }
}

/// Aggregate counters for a route.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteCompletion {
    pub full_baskets_completed: bool,
    pub loose_items_completed: bool,
    pub total_full_baskets_scanned: u32,
    pub total_loose_scanned: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated_by: Option<String>,
}

/// A delivery route mirrored from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingRoute {
    pub id: String,
    pub items: Vec<LoadingItem>,
    pub total_full_baskets: u32,
    pub total_loose_quantity: u32,
    #[serde(default)]
    pub status: RouteStatus,
    #[serde(default)]
    pub completion: RouteCompletion,
}

impl LoadingRoute {
    /// Build a route; totals are derived from the items.
    pub fn new(id: impl Into<String>, items: Vec<LoadingItem>) -> Self {
        let total_full_baskets = items.iter().map(|i| i.expected_full_baskets).sum();
        let total_loose_quantity = items.iter().map(|i| i.expected_loose_quantity).sum();
        Self {
            id: id.into(),
            items,
            total_full_baskets,
            total_loose_quantity,
            status: RouteStatus::Pending,
            completion: RouteCompletion::default(),
        }
    }

    pub fn item(&self, product_id: &str) -> Option<&LoadingItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    pub fn item_mut(&mut self, product_id: &str) -> Option<&mut LoadingItem> {
        self.items.iter_mut().find(|i| i.product_id == product_id)
    }

    /// Every container uid that contributed to any item.
    #[must_use]
    pub fn contributing_uids(&self) -> BTreeSet<String> {
        self.items
            .iter()
            .flat_map(|i| i.completion.contributing_uids.iter().cloned())
            .collect()
    }
}
