//! Route Completion Service
//!
//! Applies completion changes to stored routes. Each change is one
//! read-compute-write unit under the route's lock, so two items finishing at
//! the same moment cannot overwrite each other's progress.

use crate::domain;
use crate::error::{CompletionError, CompletionResult};
use bt_01_container_store::RouteStore;
use shared_types::{KeyedLocks, LoadingRoute, RouteStatus, Timestamp};
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one completion update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionOutcome {
    /// Route state after the update, as persisted.
    pub route: LoadingRoute,
    pub previous_status: RouteStatus,
    pub status_changed: bool,
    /// `false` when the update was a no-op (e.g. a repeated uid).
    pub applied: bool,
}

pub struct RouteCompletionService<R: RouteStore> {
    routes: Arc<R>,
    locks: KeyedLocks,
}

impl<R: RouteStore> RouteCompletionService<R> {
    pub fn new(routes: Arc<R>) -> Self {
        Self {
            routes,
            locks: KeyedLocks::new(),
        }
    }

    pub fn routes(&self) -> &Arc<R> {
        &self.routes
    }

    pub async fn record_full_basket(
        &self,
        route_id: &str,
        product_id: &str,
        uid: &str,
        now: Timestamp,
        actor: Option<&str>,
    ) -> CompletionResult<CompletionOutcome> {
        self.update(route_id, |route| {
            domain::record_full_basket(route, product_id, uid, now, actor)
        })
        .await
    }

    pub async fn record_loose_items(
        &self,
        route_id: &str,
        product_id: &str,
        quantity: u32,
        uid: Option<&str>,
        now: Timestamp,
        actor: Option<&str>,
    ) -> CompletionResult<CompletionOutcome> {
        self.update(route_id, |route| {
            domain::record_loose_items(route, product_id, quantity, uid, now, actor)?;
            Ok(quantity > 0)
        })
        .await
    }

    pub async fn confirm_full_baskets(
        &self,
        route_id: &str,
        product_id: &str,
        now: Timestamp,
        actor: Option<&str>,
    ) -> CompletionResult<CompletionOutcome> {
        self.update(route_id, |route| {
            domain::confirm_full_baskets(route, product_id, now, actor)?;
            Ok(true)
        })
        .await
    }

    pub async fn mark_verified(
        &self,
        route_id: &str,
        now: Timestamp,
        actor: Option<&str>,
    ) -> CompletionResult<CompletionOutcome> {
        self.update(route_id, |route| {
            domain::mark_verified(route, now, actor);
            Ok(true)
        })
        .await
    }

    pub async fn reset(&self, route_id: &str) -> CompletionResult<CompletionOutcome> {
        self.update(route_id, |route| {
            domain::reset(route);
            Ok(true)
        })
        .await
    }

    /// Recompute from the stored counters.
    pub async fn recompute(&self, route_id: &str) -> CompletionResult<CompletionOutcome> {
        self.update(route_id, |route| {
            domain::recompute(route);
            Ok(true)
        })
        .await
    }

    /// Store a route fetched from the backend, keeping local progress.
    pub async fn sync_route(&self, remote: LoadingRoute) -> CompletionResult<CompletionOutcome> {
        let route_id = remote.id.clone();
        let _held = self.locks.lock(&route_id).await;

        let local = self.routes.get_route(&route_id)?;
        let previous_status = local.as_ref().map(|r| r.status).unwrap_or_default();
        let route = domain::merge_remote(local.as_ref(), remote);
        self.routes.put_route(route.clone())?;

        debug!(route_id = %route_id, status = %route.status, "[bt-05] route synced");
        Ok(CompletionOutcome {
            status_changed: route.status != previous_status,
            route,
            previous_status,
            applied: true,
        })
    }

    async fn update<F>(&self, route_id: &str, apply: F) -> CompletionResult<CompletionOutcome>
    where
        F: FnOnce(&mut LoadingRoute) -> CompletionResult<bool>,
    {
        let _held = self.locks.lock(route_id).await;

        let mut route =
            self.routes
                .get_route(route_id)?
                .ok_or_else(|| CompletionError::RouteNotFound {
                    route_id: route_id.to_string(),
                })?;
        let previous_status = route.status;

        let applied = apply(&mut route)?;
        if applied {
            self.routes.put_route(route.clone())?;
        }

        let status_changed = route.status != previous_status;
        if status_changed {
            info!(
                route_id = %route_id,
                from = %previous_status,
                to = %route.status,
                "[bt-05] route status changed"
            );
        } else {
            debug!(route_id = %route_id, applied, "[bt-05] route completion updated");
        }

        Ok(CompletionOutcome {
            route,
            previous_status,
            status_changed,
            applied,
        })
    }
}
