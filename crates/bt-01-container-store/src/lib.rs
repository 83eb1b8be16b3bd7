//! # Container Store (bt-01)
//!
//! Typed CRUD contract over the locally persisted container and route
//! records. The storage engine itself is an adapter detail; the sync engine
//! only depends on the `ContainerStore` / `RouteStore` ports.
//!
//! ## Queries
//!
//! | Query | Filter | Order |
//! |-------|--------|-------|
//! | `find_by_warehouse` | warehouseId + status set | uid |
//! | `find_for_issue` | product + warehouse + status | quantity desc, lastUpdated asc, uid |
//!
//! The issue ordering hands out the fullest container first and, among equals,
//! the one untouched the longest (FIFO-like rotation of stock).
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - query model and errors
//! - `ports/` - `ContainerStore`, `RouteStore`
//! - `adapters/` - in-memory and JSON-file implementations

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::{
    FileBackedContainerStore, FileBackedRouteStore, InMemoryContainerStore, InMemoryRouteStore,
};
pub use domain::{ContainerQuery, StoreError, StoreResult};
pub use ports::{ContainerStore, RouteStore};
