//! Production, transfer, clear, sampling and delete.

use super::SyncCoordinator;
use crate::domain::{BulkUpdateReport, DeleteScope, SyncPath};
use crate::error::{SyncError, SyncResult};
use crate::ports::{Connectivity, RemoteApi, SamplingRequest};
use bt_01_container_store::{ContainerStore, RouteStore};
use bt_02_outbox::{OperationType, OutboxQueue};
use bt_03_field_resolution::{BasketUpdate, BulkUpdateRequest, CommonData, UpdateType};
use bt_04_container_lifecycle::{transition, Workflow};
use shared_bus::{EventPublisher, SyncEvent};
use shared_types::{ContainerStatus, TimeSource};
use tracing::{debug, info, warn};

impl<C, R, O, A, N, T> SyncCoordinator<C, R, O, A, N, T>
where
    C: ContainerStore,
    R: RouteStore,
    O: OutboxQueue,
    A: RemoteApi,
    N: Connectivity,
    T: TimeSource,
{
    /// Fill containers on the production line.
    ///
    /// Every basket ends `IN_PRODUCTION` with the product, batch and dates of
    /// `common`; unknown uids are registered. Item-level status overrides are
    /// ignored.
    pub async fn submit_production(
        &self,
        common: CommonData,
        baskets: Vec<BasketUpdate>,
        actor: Option<&str>,
    ) -> SyncResult<BulkUpdateReport> {
        let online = self.connectivity.is_online();
        let mut common = common.with_status(ContainerStatus::InProduction);
        if let Some(actor) = self.actor(actor) {
            common = common.with_update_by(actor);
        }
        let mut request = BulkUpdateRequest::new(UpdateType::Production, common);
        request.baskets = baskets
            .into_iter()
            .map(|mut basket| {
                basket.status = None;
                basket
            })
            .collect();

        let report = self.execute_bulk_exclusive(online, request).await?;
        info!(
            updated = report.updated.len(),
            queued = report.path.as_ref().is_some_and(SyncPath::is_queued),
            "[bt-06] 🏭 production submitted"
        );
        Ok(report)
    }

    /// Move containers to another warehouse. Status is unchanged.
    pub async fn transfer_containers(
        &self,
        uids: &[String],
        to_warehouse: &str,
        actor: Option<&str>,
    ) -> SyncResult<BulkUpdateReport> {
        let online = self.connectivity.is_online();
        let common = self.common_for(actor).with_warehouse(to_warehouse);
        let request = BulkUpdateRequest::for_uids(UpdateType::Transfer, common, uids.iter().cloned());
        let report = self.execute_bulk_exclusive(online, request).await?;
        self.log_report(UpdateType::Transfer, &report);
        Ok(report)
    }

    /// Return containers to `UNASSIGNED`, empty and unassociated.
    pub async fn clear_containers(
        &self,
        uids: &[String],
        actor: Option<&str>,
    ) -> SyncResult<BulkUpdateReport> {
        let online = self.connectivity.is_online();
        let common = self.common_for(actor);
        let request = BulkUpdateRequest::for_uids(UpdateType::Clear, common, uids.iter().cloned());
        let report = self.execute_bulk_exclusive(online, request).await?;
        for uid in report.updated_uids() {
            self.debouncer.forget(&uid);
        }
        self.log_report(UpdateType::Clear, &report);
        Ok(report)
    }

    /// Apply a caller-built bulk update as is.
    pub async fn apply_bulk_update(
        &self,
        request: BulkUpdateRequest,
    ) -> SyncResult<BulkUpdateReport> {
        let online = self.connectivity.is_online();
        let update_type = request.update_type;
        let report = self.execute_bulk_exclusive(online, request).await?;
        self.log_report(update_type, &report);
        Ok(report)
    }

    /// Pull a container for sampling.
    pub async fn mark_sampling(&self, uid: &str, actor: Option<&str>) -> SyncResult<SyncPath> {
        let online = self.connectivity.is_online();
        let _held = self.in_flight.acquire(uid).await;

        let mut container = self
            .containers
            .get(uid)?
            .ok_or_else(|| SyncError::ContainerNotFound {
                uid: uid.to_string(),
            })?;
        let now = self.now();
        let actor = self.actor(actor);

        let request = SamplingRequest {
            uid: uid.to_string(),
            update_by: actor.clone(),
            marked_at: now,
        };
        let payload = serde_json::to_value(&request)?;
        let path = self
            .dispatch(
                online,
                OperationType::SamplingMark,
                uid.to_string(),
                payload,
                || self.remote.mark_sampling(&request),
            )
            .await?;

        container.status = transition(Workflow::Sampling, container.status)?;
        container.last_updated = now;
        if actor.is_some() {
            container.update_by = actor;
        }
        self.persist(vec![container]).await?;
        info!(uid = %uid, "[bt-06] 🧪 container marked for sampling");
        Ok(path)
    }

    /// Remove a container record.
    ///
    /// `LocalOnly` forgets it on this device; `Remote` also deletes it on the
    /// server and returns the path that took.
    pub async fn delete_container(
        &self,
        uid: &str,
        scope: DeleteScope,
    ) -> SyncResult<Option<SyncPath>> {
        let online = self.connectivity.is_online();
        let _held = self.in_flight.acquire(uid).await;

        let path = match scope {
            DeleteScope::LocalOnly => None,
            DeleteScope::Remote => {
                let payload = serde_json::json!({ "rfid": uid });
                let path = self
                    .dispatch(
                        online,
                        OperationType::DeleteContainer,
                        uid.to_string(),
                        payload,
                        || self.remote.delete_container(uid),
                    )
                    .await?;
                Some(path)
            }
        };

        let deleted = self.containers.delete(uid)?;
        if !deleted && path.is_none() {
            return Err(SyncError::ContainerNotFound {
                uid: uid.to_string(),
            });
        }
        self.debouncer.forget(uid);
        if deleted {
            self.bus
                .publish(SyncEvent::ContainerDeleted {
                    uid: uid.to_string(),
                })
                .await;
        }
        info!(uid = %uid, ?scope, "[bt-06] container deleted");
        Ok(path)
    }

    fn log_report(&self, update_type: UpdateType, report: &BulkUpdateReport) {
        if report.is_partial() {
            warn!(
                update = %update_type,
                updated = report.updated.len(),
                skipped = ?report.skipped,
                "[bt-06] bulk update partially applied"
            );
        } else {
            debug!(update = %update_type, updated = report.updated.len(), "[bt-06] bulk update applied");
        }
    }
}
