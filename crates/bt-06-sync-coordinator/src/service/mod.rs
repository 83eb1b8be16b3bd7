//! # Sync Coordinator Service
//!
//! Owns the online-call-or-enqueue decision for every workflow.
//!
//! Workflow operations live in sibling modules:
//! - `scans` - receiving and inventory
//! - `routes` - loading, shipping verification, route maintenance
//! - `containers` - production, transfer, clear, sampling, delete
//!
//! This module holds the shared write path (`dispatch`, `execute_bulk`,
//! `persist`) and the event plumbing.

mod containers;
mod routes;
mod scans;

use crate::config::SyncConfig;
use crate::domain::{BulkUpdateReport, SyncPath};
use crate::error::{RemoteError, SyncResult};
use crate::ports::{Connectivity, RemoteApi};
use basket_telemetry::{
    record_outbox_append, record_remote_fallback, record_route_transition, record_scan,
    record_store_write, set_outbox_pending,
};
use bt_01_container_store::{ContainerStore, RouteStore};
use bt_02_outbox::{batch_key, OperationType, OutboxQueue, Uuid};
use bt_03_field_resolution::{resolve_batch, BulkUpdateRequest, UpdateType};
use bt_04_container_lifecycle::{
    InFlightGuard, ScanDebouncer, ScanValidation, ShippingSession, Workflow,
};
use bt_05_route_completion::{CompletionOutcome, RouteCompletionService};
use parking_lot::Mutex;
use shared_bus::{EventFilter, EventPublisher, InMemoryEventBus, Subscription, SyncEvent};
use shared_types::{Container, TimeSource, Timestamp};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Collaborators injected into the coordinator.
pub struct SyncDependencies<C, R, O, A, N, T> {
    pub containers: Arc<C>,
    pub routes: Arc<R>,
    pub outbox: Arc<O>,
    pub remote: Arc<A>,
    pub connectivity: Arc<N>,
    pub time: Arc<T>,
    pub bus: Arc<InMemoryEventBus>,
}

/// The Sync Coordinator.
///
/// Constructed once at startup and shared by handle. Every public operation
/// returns a `SyncResult`; remote failures never surface as errors from a
/// write, they turn into `SyncPath::Queued`.
pub struct SyncCoordinator<C, R, O, A, N, T>
where
    C: ContainerStore,
    R: RouteStore,
    O: OutboxQueue,
    A: RemoteApi,
    N: Connectivity,
    T: TimeSource,
{
    pub(crate) containers: Arc<C>,
    pub(crate) outbox: Arc<O>,
    pub(crate) remote: Arc<A>,
    pub(crate) connectivity: Arc<N>,
    pub(crate) time: Arc<T>,
    pub(crate) bus: Arc<InMemoryEventBus>,
    pub(crate) config: SyncConfig,
    /// Per-route serialised completion updates.
    pub(crate) completion: RouteCompletionService<R>,
    pub(crate) debouncer: ScanDebouncer,
    pub(crate) in_flight: InFlightGuard,
    /// Open shipping verifications by route id.
    pub(crate) shipping: Mutex<HashMap<String, ShippingSession>>,
}

impl<C, R, O, A, N, T> SyncCoordinator<C, R, O, A, N, T>
where
    C: ContainerStore,
    R: RouteStore,
    O: OutboxQueue,
    A: RemoteApi,
    N: Connectivity,
    T: TimeSource,
{
    pub fn new(deps: SyncDependencies<C, R, O, A, N, T>, config: SyncConfig) -> Self {
        let debouncer = ScanDebouncer::new(config.scan_debounce, config.debounce_retention);
        Self {
            containers: deps.containers,
            outbox: deps.outbox,
            remote: deps.remote,
            connectivity: deps.connectivity,
            time: deps.time,
            bus: deps.bus,
            completion: RouteCompletionService::new(deps.routes),
            debouncer,
            in_flight: InFlightGuard::new(),
            shipping: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Outbox entries awaiting replay.
    pub fn pending_count(&self) -> SyncResult<usize> {
        Ok(self.outbox.count()?)
    }

    /// Called by the replay process once an outbox entry reached the server.
    pub async fn acknowledge(&self, operation_id: Uuid) -> SyncResult<bool> {
        if !self.outbox.acknowledge(operation_id)? {
            return Ok(false);
        }
        let pending = self.outbox.count()?;
        set_outbox_pending(pending);
        self.bus
            .publish(SyncEvent::OperationAcknowledged {
                operation_id: operation_id.to_string(),
                pending,
            })
            .await;
        Ok(true)
    }

    /// Change notifications for containers, outbox, routes and scans.
    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        self.bus.subscribe(filter)
    }

    // =========================================================================
    // SHARED WRITE PATH
    // =========================================================================

    pub(crate) fn now(&self) -> Timestamp {
        self.time.now()
    }

    /// Explicit actor, else the configured default.
    pub(crate) fn actor(&self, actor: Option<&str>) -> Option<String> {
        actor
            .map(str::to_string)
            .or_else(|| self.config.default_actor.clone())
    }

    /// Await a remote call under the configured time bound.
    pub(crate) async fn call_remote<V, Fut>(&self, call: Fut) -> Result<V, RemoteError>
    where
        Fut: Future<Output = Result<V, RemoteError>>,
    {
        match tokio::time::timeout(self.config.remote_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RemoteError::Timeout {
                after_ms: self.config.remote_timeout.as_millis() as u64,
            }),
        }
    }

    /// Deliver a write: remote call when online, outbox otherwise or on any
    /// remote failure. Returns once one of the two has succeeded.
    pub(crate) async fn dispatch<F, Fut>(
        &self,
        online: bool,
        operation: OperationType,
        target_key: String,
        payload: serde_json::Value,
        call: F,
    ) -> SyncResult<SyncPath>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), RemoteError>>,
    {
        let remote_error = if online {
            match self.call_remote(call()).await {
                Ok(()) => {
                    debug!(operation = %operation, target = %target_key, "[bt-06] remote write ok");
                    return Ok(SyncPath::Online);
                }
                Err(e) => {
                    warn!(
                        operation = %operation,
                        target = %target_key,
                        error = %e,
                        "[bt-06] remote write failed, deferring to outbox"
                    );
                    Some(e)
                }
            }
        } else {
            None
        };

        let reason = remote_error.as_ref().map_or("offline", RemoteError::reason);
        let queued = self
            .outbox
            .enqueue(operation, target_key, payload, self.now())?;
        let pending = self.outbox.count()?;

        record_remote_fallback(reason);
        record_outbox_append(operation.as_str());
        set_outbox_pending(pending);
        info!(
            operation = %operation,
            operation_id = %queued.operation_id,
            target = %queued.target_key,
            reason,
            pending,
            "[bt-06] 📥 write queued"
        );

        self.bus
            .publish(SyncEvent::OperationQueued {
                operation_id: queued.operation_id.to_string(),
                operation_type: operation.as_str().to_string(),
                target_key: queued.target_key.clone(),
                pending,
            })
            .await;

        Ok(SyncPath::Queued {
            operation_id: queued.operation_id,
            remote_error,
        })
    }

    /// `execute_bulk` under the in-flight guard of every uid in the request.
    pub(crate) async fn execute_bulk_exclusive(
        &self,
        online: bool,
        request: BulkUpdateRequest,
    ) -> SyncResult<BulkUpdateReport> {
        let _held = self.in_flight.acquire_all(request.uids()).await;
        self.execute_bulk(online, request).await
    }

    /// Resolve, deliver and persist a bulk update.
    ///
    /// The caller holds the in-flight guard of every uid in the request for
    /// the whole call: records are read before the remote call and written
    /// after it.
    ///
    /// Baskets with no local record (outside production) are skipped and
    /// dropped from the request that is sent, so server and device agree.
    pub(crate) async fn execute_bulk(
        &self,
        online: bool,
        request: BulkUpdateRequest,
    ) -> SyncResult<BulkUpdateReport> {
        let now = self.now();
        let existing: HashMap<String, Container> = self
            .containers
            .get_many(&request.uids())?
            .into_iter()
            .map(|c| (c.uid.clone(), c))
            .collect();
        let batch = resolve_batch(&request, |uid| existing.get(uid).cloned(), now)?;

        let mut report = BulkUpdateReport {
            skipped: batch.missing.clone(),
            warnings: batch.warnings().cloned().collect(),
            ..BulkUpdateReport::default()
        };
        if batch.resolved.is_empty() {
            debug!(update = %request.update_type, "[bt-06] nothing left to update");
            return Ok(report);
        }

        let mut sent = request;
        sent.baskets.retain(|b| !batch.missing.contains(&b.uid));
        let operation = operation_for(sent.update_type);
        let key = batch_key(operation, &sent.uids());
        let payload = serde_json::to_value(&sent)?;

        let path = self
            .dispatch(online, operation, key, payload, || {
                self.remote.bulk_update(&sent)
            })
            .await?;

        let containers = batch.containers();
        self.persist(containers.clone()).await?;

        report.path = Some(path);
        report.updated = containers;
        Ok(report)
    }

    /// Write records locally and announce them.
    pub(crate) async fn persist(&self, containers: Vec<Container>) -> SyncResult<()> {
        if containers.is_empty() {
            return Ok(());
        }
        let events: Vec<SyncEvent> = containers
            .iter()
            .map(|c| SyncEvent::ContainerUpdated {
                uid: c.uid.clone(),
                status: c.status,
                warehouse_id: c.warehouse_id.clone(),
            })
            .collect();

        let count = containers.len();
        self.containers.upsert_many(containers)?;
        record_store_write(count);

        for event in events {
            self.bus.publish(event).await;
        }
        Ok(())
    }

    /// Local record, or (when online and missing) the server's record,
    /// mirrored locally. Remote failures read as "not registered".
    pub(crate) async fn lookup_for_scan(
        &self,
        uid: &str,
        online: bool,
    ) -> SyncResult<Option<Container>> {
        if let Some(container) = self.containers.get(uid)? {
            return Ok(Some(container));
        }
        if !online {
            return Ok(None);
        }

        match self.call_remote(self.remote.fetch_container(uid)).await {
            Ok(container) => {
                debug!(uid = %uid, "[bt-06] container fetched from remote");
                self.persist(vec![container.clone()]).await?;
                Ok(Some(container))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => {
                warn!(uid = %uid, error = %e, "[bt-06] remote lookup failed");
                Ok(None)
            }
        }
    }

    pub(crate) async fn reject(&self, workflow: Workflow, validation: &ScanValidation) {
        record_scan(workflow.as_str(), validation.outcome());
        warn!(
            uid = %validation.uid(),
            workflow = %workflow,
            outcome = validation.outcome(),
            "[bt-06] scan rejected"
        );
        self.bus
            .publish(SyncEvent::ScanRejected {
                uid: validation.uid().to_string(),
                workflow: workflow.as_str().to_string(),
                reason: validation.outcome().to_string(),
            })
            .await;
    }

    /// Drop a repeat read. Returns `true` if the scan should proceed.
    pub(crate) fn debounce(&self, workflow: Workflow, uid: &str) -> bool {
        if self.debouncer.accept(uid, self.now()) {
            return true;
        }
        debug!(uid = %uid, workflow = %workflow, "[bt-06] scan debounced");
        record_scan(workflow.as_str(), "debounced");
        false
    }

    pub(crate) async fn announce_route(&self, outcome: &CompletionOutcome) {
        if outcome.status_changed {
            record_route_transition(outcome.route.status.as_str());
        }
        self.bus
            .publish(SyncEvent::RouteProgressed {
                route_id: outcome.route.id.clone(),
                status: outcome.route.status,
                full_baskets_completed: outcome.route.completion.full_baskets_completed,
                loose_items_completed: outcome.route.completion.loose_items_completed,
            })
            .await;
    }
}

pub(crate) fn operation_for(update_type: UpdateType) -> OperationType {
    match update_type {
        UpdateType::Production => OperationType::ProductionUpdate,
        UpdateType::Receiving => OperationType::ReceivingUpdate,
        UpdateType::Transfer => OperationType::TransferUpdate,
        UpdateType::Clear => OperationType::ClearUpdate,
    }
}
