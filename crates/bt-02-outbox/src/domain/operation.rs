//! Pending operation model.

use serde::{Deserialize, Serialize};
use shared_types::Timestamp;
use std::fmt;
use uuid::Uuid;

/// Identifies the workflow that produced a queued write and therefore the
/// shape of its payload and the remote endpoint it replays against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    ProductionUpdate,
    ReceivingUpdate,
    TransferUpdate,
    ClearUpdate,
    LoadingSubmit,
    ShippingVerification,
    SamplingMark,
    DeleteContainer,
}

impl OperationType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductionUpdate => "production_update",
            Self::ReceivingUpdate => "receiving_update",
            Self::TransferUpdate => "transfer_update",
            Self::ClearUpdate => "clear_update",
            Self::LoadingSubmit => "loading_submit",
            Self::ShippingVerification => "shipping_verification",
            Self::SamplingMark => "sampling_mark",
            Self::DeleteContainer => "delete_container",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deferred remote write.
///
/// `payload` is the exact request body that the replay process sends; the
/// queue never inspects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingOperation {
    /// Insertion order, strictly increasing for the lifetime of a queue.
    pub sequence: u64,
    /// Idempotency key for replay.
    pub operation_id: Uuid,
    pub operation_type: OperationType,
    /// Container uid, or a synthetic batch / route key.
    pub target_key: String,
    pub payload: serde_json::Value,
    pub created_at: Timestamp,
}

impl PendingOperation {
    pub(crate) fn new(
        sequence: u64,
        operation_type: OperationType,
        target_key: String,
        payload: serde_json::Value,
        created_at: Timestamp,
    ) -> Self {
        Self {
            sequence,
            operation_id: Uuid::new_v4(),
            operation_type,
            target_key,
            payload,
            created_at,
        }
    }
}
