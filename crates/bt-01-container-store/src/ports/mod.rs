//! Ports for the Container Store.

pub mod inbound;

pub use inbound::{ContainerStore, RouteStore};
