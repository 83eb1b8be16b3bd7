//! Outbox port, driven by the sync coordinator.

use crate::domain::{OperationType, OutboxResult, PendingOperation};
use shared_types::Timestamp;
use uuid::Uuid;

/// Append-only queue of deferred remote writes.
///
/// `enqueue` is synchronous: when it returns `Ok` the entry is recorded and
/// the caller may report the offline path as successful.
pub trait OutboxQueue: Send + Sync {
    fn enqueue(
        &self,
        operation_type: OperationType,
        target_key: String,
        payload: serde_json::Value,
        created_at: Timestamp,
    ) -> OutboxResult<PendingOperation>;

    /// Entries not yet acknowledged by replay.
    fn count(&self) -> OutboxResult<usize>;

    /// Unacknowledged entries in insertion order.
    fn pending(&self) -> OutboxResult<Vec<PendingOperation>>;

    /// Mark an entry as replayed. Unknown ids return `Ok(false)`.
    fn acknowledge(&self, operation_id: Uuid) -> OutboxResult<bool>;
}
