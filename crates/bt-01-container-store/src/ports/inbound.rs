//! Store ports consumed by the sync engine.
//!
//! Methods take `&self`; adapters own their interior locking so a single
//! store can be shared behind an `Arc` across workflow tasks.

use crate::domain::{ContainerQuery, StoreResult};
use shared_types::{Container, ContainerStatus, LoadingRoute};

/// Typed CRUD over container records keyed by uid.
pub trait ContainerStore: Send + Sync {
    fn get(&self, uid: &str) -> StoreResult<Option<Container>>;

    /// Insert or replace. The record is durable once this returns `Ok`.
    fn upsert(&self, container: Container) -> StoreResult<()>;

    /// Insert or replace several records as one write.
    fn upsert_many(&self, containers: Vec<Container>) -> StoreResult<()>;

    /// Remove a record. Returns whether it existed.
    fn delete(&self, uid: &str) -> StoreResult<bool>;

    /// Evaluate a filtered query.
    fn query(&self, query: &ContainerQuery) -> StoreResult<Vec<Container>>;

    /// Every record, ordered by uid.
    fn all(&self) -> StoreResult<Vec<Container>>;

    fn count(&self) -> StoreResult<usize>;

    /// Records for the given uids, in request order. Unknown uids are skipped.
    fn get_many(&self, uids: &[String]) -> StoreResult<Vec<Container>> {
        let mut found = Vec::with_capacity(uids.len());
        for uid in uids {
            if let Some(container) = self.get(uid)? {
                found.push(container);
            }
        }
        Ok(found)
    }

    fn find_by_warehouse(
        &self,
        warehouse_id: &str,
        statuses: &[ContainerStatus],
    ) -> StoreResult<Vec<Container>> {
        self.query(&ContainerQuery::by_warehouse(warehouse_id, statuses))
    }

    /// Issue candidates: quantity desc, then least recently updated, then uid.
    fn find_for_issue(
        &self,
        product_id: &str,
        warehouse_id: &str,
        status: ContainerStatus,
    ) -> StoreResult<Vec<Container>> {
        self.query(&ContainerQuery::for_issue(product_id, warehouse_id, status))
    }
}

/// Local mirror of delivery routes and their completion state.
pub trait RouteStore: Send + Sync {
    fn get_route(&self, route_id: &str) -> StoreResult<Option<LoadingRoute>>;

    fn put_route(&self, route: LoadingRoute) -> StoreResult<()>;

    fn delete_route(&self, route_id: &str) -> StoreResult<bool>;

    /// All routes, ordered by id.
    fn list_routes(&self) -> StoreResult<Vec<LoadingRoute>>;
}
