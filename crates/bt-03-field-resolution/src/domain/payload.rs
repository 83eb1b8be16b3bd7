//! Bulk update wire payload.
//!
//! This is the exact body sent to the bulk-update endpoint and the exact
//! payload stored in the outbox when the call is deferred:
//!
//! ```json
//! {
//!   "updateType": "RECEIVING",
//!   "commonData": { "status": "IN_STOCK", "warehouseId": "W1", "updateBy": "op" },
//!   "baskets": [ { "rfid": "X1" }, { "rfid": "X2", "quantity": 12 } ]
//! }
//! ```
//!
//! Status values are kept as raw strings so a malformed value survives
//! transport and is resolved (with a warning) instead of rejected.

use serde::{Deserialize, Serialize};
use shared_types::ContainerStatus;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateType {
    Production,
    Receiving,
    Transfer,
    Clear,
}

impl UpdateType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "PRODUCTION",
            Self::Receiving => "RECEIVING",
            Self::Transfer => "TRANSFER",
            Self::Clear => "CLEAR",
        }
    }
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Batch-level defaults shared by every basket in the request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_by: Option<String>,
    #[serde(rename = "product", default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(rename = "batch", default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expire_date: Option<String>,
}

impl CommonData {
    pub fn with_status(mut self, status: ContainerStatus) -> Self {
        self.status = Some(status.as_str().to_string());
        self
    }

    pub fn with_warehouse(mut self, warehouse_id: impl Into<String>) -> Self {
        self.warehouse_id = Some(warehouse_id.into());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn with_update_by(mut self, actor: impl Into<String>) -> Self {
        self.update_by = Some(actor.into());
        self
    }

    pub fn with_product(mut self, product_id: impl Into<String>, batch_id: impl Into<String>) -> Self {
        self.product_id = Some(product_id.into());
        self.batch_id = Some(batch_id.into());
        self
    }

    pub fn with_dates(
        mut self,
        production_date: impl Into<String>,
        expire_date: impl Into<String>,
    ) -> Self {
        self.production_date = Some(production_date.into());
        self.expire_date = Some(expire_date.into());
        self
    }
}

/// Per-basket overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketUpdate {
    #[serde(rename = "rfid")]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl BasketUpdate {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            status: None,
            warehouse_id: None,
            quantity: None,
        }
    }

    pub fn with_status(mut self, status: ContainerStatus) -> Self {
        self.status = Some(status.as_str().to_string());
        self
    }

    pub fn with_warehouse(mut self, warehouse_id: impl Into<String>) -> Self {
        self.warehouse_id = Some(warehouse_id.into());
        self
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateRequest {
    pub update_type: UpdateType,
    pub common_data: CommonData,
    pub baskets: Vec<BasketUpdate>,
}

impl BulkUpdateRequest {
    pub fn new(update_type: UpdateType, common_data: CommonData) -> Self {
        Self {
            update_type,
            common_data,
            baskets: Vec::new(),
        }
    }

    /// Request with one bare basket entry per uid.
    pub fn for_uids<I, S>(update_type: UpdateType, common_data: CommonData, uids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            update_type,
            common_data,
            baskets: uids.into_iter().map(BasketUpdate::new).collect(),
        }
    }

    pub fn with_basket(mut self, basket: BasketUpdate) -> Self {
        self.baskets.push(basket);
        self
    }

    pub fn uids(&self) -> Vec<String> {
        self.baskets.iter().map(|b| b.uid.clone()).collect()
    }
}
