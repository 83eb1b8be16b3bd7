//! # Outbox Queue (bt-02)
//!
//! Durable, append-only log of remote writes that could not be delivered.
//! The sync engine appends here whenever it is offline or a remote call
//! fails; an external replay process drains the queue on reconnect and
//! acknowledges each entry.
//!
//! ## Guarantees
//!
//! - `enqueue` returns only after the entry is durable (adapter-dependent).
//! - Entries are never mutated; `pending()` yields them in insertion order.
//! - Each entry carries a UUID `operation_id` so replay stays idempotent
//!   under at-least-once delivery.
//!
//! ## Durable log format
//!
//! `FileBackedOutbox` writes one JSON object per line:
//!
//! ```text
//! {"kind":"enqueue","sequence":0,"operationId":"…","operationType":"clear_update",…}
//! {"kind":"ack","operationId":"…"}
//! ```
//!
//! The live set is rebuilt on open by replaying the log. A torn final line
//! (crash mid-append) is dropped and truncated away.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::{FileBackedOutbox, InMemoryOutbox};
pub use domain::{
    batch_key, route_key, OperationType, OutboxError, OutboxResult, PendingOperation,
};
pub use ports::OutboxQueue;
pub use uuid::Uuid;
