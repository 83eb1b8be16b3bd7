//! Loading, shipping verification and route maintenance.
//!
//! Loading scans are staged on the device: each one moves the container to
//! `LOADING` locally and advances the route's completion. The route goes to
//! the server in one `submit_loading` call. Shipping verification keeps an
//! in-memory session per route until it is submitted.

use super::SyncCoordinator;
use crate::domain::{LoadingScanOutcome, ShippingReport, ShippingScanOutcome, SyncPath};
use crate::error::{SyncError, SyncResult};
use crate::ports::{Connectivity, LoadingSubmission, RemoteApi, ShippingSubmission};
use basket_telemetry::record_scan;
use bt_01_container_store::{ContainerStore, RouteStore};
use bt_02_outbox::{route_key, OperationType, OutboxQueue};
use bt_04_container_lifecycle::{
    transition, validate_loading, ScanValidation, ShippingScan, ShippingSession, Workflow,
};
use bt_05_route_completion::{CompletionError, CompletionOutcome};
use shared_types::{LoadingRoute, TimeSource};
use tracing::{info, warn};

impl<C, R, O, A, N, T> SyncCoordinator<C, R, O, A, N, T>
where
    C: ContainerStore,
    R: RouteStore,
    O: OutboxQueue,
    A: RemoteApi,
    N: Connectivity,
    T: TimeSource,
{
    pub fn route(&self, route_id: &str) -> SyncResult<LoadingRoute> {
        self.completion
            .routes()
            .get_route(route_id)?
            .ok_or_else(|| {
                CompletionError::RouteNotFound {
                    route_id: route_id.to_string(),
                }
                .into()
            })
    }

    pub fn list_routes(&self) -> SyncResult<Vec<LoadingRoute>> {
        Ok(self.completion.routes().list_routes()?)
    }

    /// Load one full basket onto a route.
    ///
    /// The container must be `IN_STOCK` in `source_warehouse` and hold a
    /// product the route expects. On success its warehouse becomes the route
    /// id and the route's completion is recomputed.
    pub async fn scan_loading(
        &self,
        route_id: &str,
        source_warehouse: &str,
        uid: &str,
        actor: Option<&str>,
    ) -> SyncResult<LoadingScanOutcome> {
        let online = self.connectivity.is_online();
        if !self.debounce(Workflow::Loading, uid) {
            return Ok(LoadingScanOutcome::Debounced);
        }
        let _held = self.in_flight.acquire(uid).await;

        let route = self.route(route_id)?;
        let found = self.lookup_for_scan(uid, online).await?;
        let container = match validate_loading(uid, found, source_warehouse) {
            ScanValidation::Valid(container) => container,
            rejected => {
                self.reject(Workflow::Loading, &rejected).await;
                return Ok(LoadingScanOutcome::Rejected(rejected));
            }
        };

        let product_id = match container.product_id.clone() {
            Some(product) if route.item(&product).is_some() => product,
            other => {
                let rejected = ScanValidation::Error(format!(
                    "container {uid} holds {} which is not on route {route_id}",
                    other.as_deref().unwrap_or("no product")
                ));
                self.reject(Workflow::Loading, &rejected).await;
                return Ok(LoadingScanOutcome::Rejected(rejected));
            }
        };

        let now = self.now();
        let actor = self.actor(actor);
        let completion = self
            .completion
            .record_full_basket(route_id, &product_id, uid, now, actor.as_deref())
            .await?;

        let mut loaded = container;
        loaded.status = transition(Workflow::Loading, loaded.status)?;
        loaded.warehouse_id = Some(route_id.to_string());
        loaded.last_updated = now;
        if actor.is_some() {
            loaded.update_by = actor;
        }
        self.persist(vec![loaded.clone()]).await?;

        record_scan(Workflow::Loading.as_str(), "accepted");
        self.announce_route(&completion).await;
        info!(
            uid = %uid,
            route_id = %route_id,
            product_id = %product_id,
            status = %completion.route.status,
            "[bt-06] 🚚 basket loaded"
        );

        Ok(LoadingScanOutcome::Accepted {
            container: loaded,
            completion,
        })
    }

    /// Record loose quantity for a product on a route.
    pub async fn record_loose_items(
        &self,
        route_id: &str,
        product_id: &str,
        quantity: u32,
        uid: Option<&str>,
        actor: Option<&str>,
    ) -> SyncResult<CompletionOutcome> {
        let actor = self.actor(actor);
        let outcome = self
            .completion
            .record_loose_items(
                route_id,
                product_id,
                quantity,
                uid,
                self.now(),
                actor.as_deref(),
            )
            .await?;
        self.announce_route(&outcome).await;
        Ok(outcome)
    }

    /// Operator confirmation that a product's full baskets are all loaded.
    pub async fn confirm_full_baskets(
        &self,
        route_id: &str,
        product_id: &str,
        actor: Option<&str>,
    ) -> SyncResult<CompletionOutcome> {
        let actor = self.actor(actor);
        let outcome = self
            .completion
            .confirm_full_baskets(route_id, product_id, self.now(), actor.as_deref())
            .await?;
        self.announce_route(&outcome).await;
        Ok(outcome)
    }

    /// Send the route's loading progress to the server.
    pub async fn submit_loading(
        &self,
        route_id: &str,
        actor: Option<&str>,
    ) -> SyncResult<SyncPath> {
        let online = self.connectivity.is_online();
        let route = self.route(route_id)?;
        let now = self.now();

        let submission = LoadingSubmission::from_route(&route, self.actor(actor), now);
        let payload = serde_json::to_value(&submission)?;
        let path = self
            .dispatch(
                online,
                OperationType::LoadingSubmit,
                route_key(route_id, now),
                payload,
                || self.remote.submit_loading(&submission),
            )
            .await?;

        info!(route_id = %route_id, queued = path.is_queued(), "[bt-06] loading submitted");
        Ok(path)
    }

    /// Verify one container before the truck leaves.
    ///
    /// The first scan for a route opens a session whose expected set is
    /// every uid loaded onto it.
    pub async fn scan_shipping(&self, route_id: &str, uid: &str) -> SyncResult<ShippingScanOutcome> {
        let online = self.connectivity.is_online();
        if !self.debounce(Workflow::ShippingVerification, uid) {
            return Ok(ShippingScanOutcome::Debounced);
        }
        let _held = self.in_flight.acquire(uid).await;

        let expected = if self.shipping.lock().contains_key(route_id) {
            None
        } else {
            Some(self.route(route_id)?.contributing_uids())
        };
        let found = self.lookup_for_scan(uid, online).await?;

        let scan = {
            let mut sessions = self.shipping.lock();
            let session = sessions.entry(route_id.to_string()).or_insert_with(|| {
                ShippingSession::new(route_id, expected.unwrap_or_default())
            });
            session.scan(uid, found)
        };

        match &scan {
            ShippingScan::Rejected(rejected) => {
                self.reject(Workflow::ShippingVerification, rejected).await;
            }
            accepted => record_scan(Workflow::ShippingVerification.as_str(), accepted.outcome()),
        }
        Ok(ShippingScanOutcome::Scanned(scan))
    }

    /// Expected uids not yet verified on an open session.
    pub fn shipping_outstanding(&self, route_id: &str) -> Option<Vec<String>> {
        self.shipping
            .lock()
            .get(route_id)
            .map(|s| s.outstanding().into_iter().collect())
    }

    /// Submit a complete verification.
    ///
    /// Every expected uid must have been verified. Verified and extra
    /// containers become `SHIPPED` and the route `VERIFIED`.
    pub async fn submit_shipping_verification(
        &self,
        route_id: &str,
        actor: Option<&str>,
    ) -> SyncResult<ShippingReport> {
        let online = self.connectivity.is_online();
        let session = self.shipping.lock().get(route_id).cloned().ok_or_else(|| {
            SyncError::NoVerificationSession {
                route_id: route_id.to_string(),
            }
        })?;
        if !session.is_complete() {
            return Err(SyncError::VerificationIncomplete {
                route_id: route_id.to_string(),
                outstanding: session.outstanding().into_iter().collect(),
            });
        }

        let accepted: Vec<String> = session.accepted().into_iter().collect();
        let _held = self.in_flight.acquire_all(&accepted).await;

        let now = self.now();
        let actor = self.actor(actor);
        let submission = ShippingSubmission {
            route_id: route_id.to_string(),
            verified_uids: session.verified().iter().cloned().collect(),
            extra_uids: session.extras().iter().cloned().collect(),
            verified_by: actor.clone(),
            verified_at: now,
        };
        let payload = serde_json::to_value(&submission)?;
        let path = self
            .dispatch(
                online,
                OperationType::ShippingVerification,
                route_key(route_id, now),
                payload,
                || self.remote.submit_shipping_verification(&submission),
            )
            .await?;

        let mut shipped = Vec::with_capacity(accepted.len());
        for mut container in self.containers.get_many(&accepted)? {
            match transition(Workflow::ShippingVerification, container.status) {
                Ok(status) => {
                    container.status = status;
                    container.last_updated = now;
                    if actor.is_some() {
                        container.update_by = actor.clone();
                    }
                    shipped.push(container);
                }
                Err(e) => {
                    warn!(uid = %container.uid, error = %e, "[bt-06] container changed during verification");
                }
            }
        }
        self.persist(shipped.clone()).await?;

        let completion = self
            .completion
            .mark_verified(route_id, now, actor.as_deref())
            .await?;
        self.shipping.lock().remove(route_id);
        self.announce_route(&completion).await;
        info!(
            route_id = %route_id,
            shipped = shipped.len(),
            extras = submission.extra_uids.len(),
            "[bt-06] ✅ route verified"
        );

        Ok(ShippingReport {
            path,
            shipped,
            completion,
        })
    }

    /// Clear all completion progress and any open verification.
    pub async fn reset_route(&self, route_id: &str) -> SyncResult<CompletionOutcome> {
        let outcome = self.completion.reset(route_id).await?;
        self.shipping.lock().remove(route_id);
        self.announce_route(&outcome).await;
        info!(route_id = %route_id, "[bt-06] route reset");
        Ok(outcome)
    }

    pub async fn recompute_route(&self, route_id: &str) -> SyncResult<CompletionOutcome> {
        let outcome = self.completion.recompute(route_id).await?;
        self.announce_route(&outcome).await;
        Ok(outcome)
    }

    /// Pull routes from the server, keeping local progress.
    ///
    /// Unlike writes there is no offline path: the caller keeps the routes
    /// it already has.
    pub async fn refresh_routes(&self) -> SyncResult<usize> {
        if !self.connectivity.is_online() {
            return Err(SyncError::Offline);
        }
        let routes = self.call_remote(self.remote.fetch_routes()).await?;

        let count = routes.len();
        for remote in routes {
            let outcome = self.completion.sync_route(remote).await?;
            self.announce_route(&outcome).await;
        }
        info!(routes = count, "[bt-06] routes refreshed");
        Ok(count)
    }
}
