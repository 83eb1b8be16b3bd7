//! Domain layer for the Outbox Queue.

pub mod errors;
pub mod keys;
pub mod operation;

pub use errors::{OutboxError, OutboxResult};
pub use keys::{batch_key, route_key};
pub use operation::{OperationType, PendingOperation};
