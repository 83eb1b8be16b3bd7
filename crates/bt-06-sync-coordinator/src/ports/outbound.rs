//! Outbound ports: the remote backend and the connectivity signal.

use crate::error::RemoteError;
use async_trait::async_trait;
use bt_03_field_resolution::BulkUpdateRequest;
use serde::{Deserialize, Serialize};
use shared_types::{Container, LoadingRoute, Timestamp};

/// Per-item progress sent with a loading submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedItem {
    pub product_id: String,
    pub full_baskets_scanned: u32,
    pub loose_scanned: u32,
    pub full_baskets_completed: bool,
    pub loose_items_completed: bool,
    pub basket_uids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingSubmission {
    pub route_id: String,
    pub items: Vec<SubmittedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<String>,
    pub submitted_at: Timestamp,
}

impl LoadingSubmission {
    pub fn from_route(route: &LoadingRoute, actor: Option<String>, now: Timestamp) -> Self {
        let items = route
            .items
            .iter()
            .map(|item| SubmittedItem {
                product_id: item.product_id.clone(),
                full_baskets_scanned: item.completion.full_baskets_scanned,
                loose_scanned: item.completion.loose_scanned,
                full_baskets_completed: item.completion.full_baskets_completed,
                loose_items_completed: item.completion.loose_items_completed,
                basket_uids: item.completion.contributing_uids.iter().cloned().collect(),
            })
            .collect();
        Self {
            route_id: route.id.clone(),
            items,
            submitted_by: actor,
            submitted_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingSubmission {
    pub route_id: String,
    pub verified_uids: Vec<String>,
    /// Containers shipped on this route that were not loaded onto it.
    pub extra_uids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,
    pub verified_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SamplingRequest {
    #[serde(rename = "rfid")]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_by: Option<String>,
    pub marked_at: Timestamp,
}

/// Remote backend.
///
/// Every call either succeeds or returns a `RemoteError`; fetches report a
/// missing resource as `RemoteError::NotFound`. Implementations need not
/// bound their own latency: the coordinator wraps each call in a timeout.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn fetch_container(&self, uid: &str) -> Result<Container, RemoteError>;

    async fn bulk_update(&self, request: &BulkUpdateRequest) -> Result<(), RemoteError>;

    async fn delete_container(&self, uid: &str) -> Result<(), RemoteError>;

    async fn fetch_routes(&self) -> Result<Vec<LoadingRoute>, RemoteError>;

    async fn submit_loading(&self, submission: &LoadingSubmission) -> Result<(), RemoteError>;

    async fn submit_shipping_verification(
        &self,
        submission: &ShippingSubmission,
    ) -> Result<(), RemoteError>;

    async fn mark_sampling(&self, request: &SamplingRequest) -> Result<(), RemoteError>;
}

/// Connectivity signal, sampled once at the start of each operation.
pub trait Connectivity: Send + Sync {
    fn is_online(&self) -> bool;
}
