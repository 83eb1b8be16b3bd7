//! Domain layer for the Container Store.

pub mod errors;
pub mod query;

pub use errors::{StoreError, StoreResult};
pub use query::ContainerQuery;
