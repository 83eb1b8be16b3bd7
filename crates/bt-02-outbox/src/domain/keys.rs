//! Target keys for queued operations.
//!
//! Single-container writes are keyed by uid. Multi-container writes get a
//! synthetic `batch:` key and route submissions a `route:` key, so the
//! replay process can log and deduplicate them by something readable.

use super::operation::OperationType;
use shared_types::Timestamp;

/// `X1` for one uid, `batch:<operation>:<first-uid>+<count>` otherwise.
pub fn batch_key(operation: OperationType, uids: &[String]) -> String {
    match uids {
        [single] => single.clone(),
        [] => format!("batch:{operation}:+0"),
        [first, ..] => format!("batch:{operation}:{first}+{}", uids.len()),
    }
}

/// `route:<id>@<timestamp>`.
pub fn route_key(route_id: &str, at: Timestamp) -> String {
    format!("route:{route_id}@{at}")
}
