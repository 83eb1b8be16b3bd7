use crate::domain::{ContainerQuery, StoreResult};
use crate::ports::{ContainerStore, RouteStore};
use parking_lot::RwLock;
use shared_types::{Container, LoadingRoute};
use std::collections::BTreeMap;

/// In-memory container store.
#[derive(Default)]
pub struct InMemoryContainerStore {
    records: RwLock<BTreeMap<String, Container>>,
}

impl InMemoryContainerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated store.
    pub fn with_containers(containers: impl IntoIterator<Item = Container>) -> Self {
        let records = containers
            .into_iter()
            .map(|c| (c.uid.clone(), c))
            .collect();
        Self {
            records: RwLock::new(records),
        }
    }
}

impl ContainerStore for InMemoryContainerStore {
    fn get(&self, uid: &str) -> StoreResult<Option<Container>> {
        Ok(self.records.read().get(uid).cloned())
    }

    fn upsert(&self, container: Container) -> StoreResult<()> {
        self.records.write().insert(container.uid.clone(), container);
        Ok(())
    }

    fn upsert_many(&self, containers: Vec<Container>) -> StoreResult<()> {
        let mut records = self.records.write();
        for container in containers {
            records.insert(container.uid.clone(), container);
        }
        Ok(())
    }

    fn delete(&self, uid: &str) -> StoreResult<bool> {
        Ok(self.records.write().remove(uid).is_some())
    }

    fn query(&self, query: &ContainerQuery) -> StoreResult<Vec<Container>> {
        Ok(query.apply(self.records.read().values()))
    }

    fn all(&self) -> StoreResult<Vec<Container>> {
        Ok(self.records.read().values().cloned().collect())
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.records.read().len())
    }
}

/// In-memory route mirror.
#[derive(Default)]
pub struct InMemoryRouteStore {
    routes: RwLock<BTreeMap<String, LoadingRoute>>,
}

impl InMemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RouteStore for InMemoryRouteStore {
    fn get_route(&self, route_id: &str) -> StoreResult<Option<LoadingRoute>> {
        Ok(self.routes.read().get(route_id).cloned())
    }

    fn put_route(&self, route: LoadingRoute) -> StoreResult<()> {
        self.routes.write().insert(route.id.clone(), route);
        Ok(())
    }

    fn delete_route(&self, route_id: &str) -> StoreResult<bool> {
        Ok(self.routes.write().remove(route_id).is_some())
    }

    fn list_routes(&self) -> StoreResult<Vec<LoadingRoute>> {
        Ok(self.routes.read().values().cloned().collect())
    }
}
