//! Receiving, inventory count and issue suggestions.

use super::SyncCoordinator;
use crate::domain::{BulkUpdateReport, ScanOutcome};
use crate::error::{SyncError, SyncResult};
use crate::ports::{Connectivity, RemoteApi};
use basket_telemetry::record_scan;
use bt_01_container_store::{ContainerStore, RouteStore};
use bt_02_outbox::OutboxQueue;
use bt_03_field_resolution::{BasketUpdate, BulkUpdateRequest, CommonData, UpdateType};
use bt_04_container_lifecycle::{
    transition, validate_inventory, validate_receiving, ScanValidation, Workflow,
};
use shared_types::{Container, ContainerStatus, TimeSource};
use std::collections::BTreeSet;
use tracing::{debug, info};

impl<C, R, O, A, N, T> SyncCoordinator<C, R, O, A, N, T>
where
    C: ContainerStore,
    R: RouteStore,
    O: OutboxQueue,
    A: RemoteApi,
    N: Connectivity,
    T: TimeSource,
{
    /// Common payload carrying only the acting user.
    pub(crate) fn common_for(&self, actor: Option<&str>) -> CommonData {
        match self.actor(actor) {
            Some(actor) => CommonData::default().with_update_by(actor),
            None => CommonData::default(),
        }
    }

    /// Receive one container into `warehouse_id`.
    ///
    /// Only `IN_PRODUCTION` containers are accepted. A uid unknown locally is
    /// looked up remotely when online. `quantity` overrides the stored count.
    pub async fn scan_receiving(
        &self,
        uid: &str,
        warehouse_id: &str,
        quantity: Option<u32>,
        actor: Option<&str>,
    ) -> SyncResult<ScanOutcome> {
        let online = self.connectivity.is_online();
        if !self.debounce(Workflow::Receiving, uid) {
            return Ok(ScanOutcome::Debounced);
        }
        let _held = self.in_flight.acquire(uid).await;

        let found = self.lookup_for_scan(uid, online).await?;
        let container = match validate_receiving(uid, found) {
            ScanValidation::Valid(container) => container,
            rejected => {
                self.reject(Workflow::Receiving, &rejected).await;
                return Ok(ScanOutcome::Rejected(rejected));
            }
        };
        let status = transition(Workflow::Receiving, container.status)?;

        let mut basket = BasketUpdate::new(uid);
        if let Some(quantity) = quantity {
            basket = basket.with_quantity(quantity);
        }
        let common = self
            .common_for(actor)
            .with_status(status)
            .with_warehouse(warehouse_id);
        let request = BulkUpdateRequest::new(UpdateType::Receiving, common).with_basket(basket);

        let report = self.execute_bulk(online, request).await?;
        let container = first_updated(report.updated, uid)?;
        record_scan(Workflow::Receiving.as_str(), "accepted");
        info!(
            uid = %uid,
            warehouse_id = %warehouse_id,
            quantity = container.quantity,
            "[bt-06] 📦 container received"
        );

        Ok(ScanOutcome::Accepted {
            container,
            path: report.path,
        })
    }

    /// Receive several containers in one update.
    ///
    /// Each uid is validated as a receiving scan; rejected uids are reported
    /// and the rest go out as a single bulk request. Every uid stays held
    /// from validation until the local write, so a scan of the same uid in
    /// flight finishes first and is seen by the validation.
    pub async fn receive_batch(
        &self,
        uids: &[String],
        warehouse_id: &str,
        actor: Option<&str>,
    ) -> SyncResult<BulkUpdateReport> {
        let online = self.connectivity.is_online();
        let _held = self.in_flight.acquire_all(uids).await;
        let mut seen = BTreeSet::new();
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();

        for uid in uids {
            if !seen.insert(uid.as_str()) {
                continue;
            }
            let found = self.lookup_for_scan(uid, online).await?;
            match validate_receiving(uid, found) {
                ScanValidation::Valid(container) => accepted.push(container.uid),
                other => {
                    self.reject(Workflow::Receiving, &other).await;
                    rejected.push(other);
                }
            }
        }

        let mut report = if accepted.is_empty() {
            BulkUpdateReport::default()
        } else {
            let common = self
                .common_for(actor)
                .with_status(ContainerStatus::InStock)
                .with_warehouse(warehouse_id);
            let request = BulkUpdateRequest::for_uids(UpdateType::Receiving, common, accepted);
            self.execute_bulk(online, request).await?
        };

        for _ in &report.updated {
            record_scan(Workflow::Receiving.as_str(), "accepted");
        }
        report.rejected = rejected;
        debug!(
            warehouse_id = %warehouse_id,
            updated = report.updated.len(),
            rejected = report.rejected.len(),
            "[bt-06] receiving batch done"
        );
        Ok(report)
    }

    /// Count one container present in `warehouse_id`.
    ///
    /// Uses the local store only. A container with no warehouse is adopted
    /// into the counted one through a transfer update; a match writes nothing.
    pub async fn scan_inventory(
        &self,
        uid: &str,
        warehouse_id: &str,
        actor: Option<&str>,
    ) -> SyncResult<ScanOutcome> {
        let online = self.connectivity.is_online();
        if !self.debounce(Workflow::InventoryCount, uid) {
            return Ok(ScanOutcome::Debounced);
        }
        let _held = self.in_flight.acquire(uid).await;

        let found = self.containers.get(uid)?;
        let container = match validate_inventory(uid, found, warehouse_id) {
            ScanValidation::Valid(container) => container,
            rejected => {
                self.reject(Workflow::InventoryCount, &rejected).await;
                return Ok(ScanOutcome::Rejected(rejected));
            }
        };
        record_scan(Workflow::InventoryCount.as_str(), "accepted");

        if container.is_in_warehouse(warehouse_id) {
            return Ok(ScanOutcome::Accepted {
                container,
                path: None,
            });
        }

        debug!(uid = %uid, warehouse_id = %warehouse_id, "[bt-06] adopting container into counted warehouse");
        let common = self.common_for(actor).with_warehouse(warehouse_id);
        let request = BulkUpdateRequest::for_uids(UpdateType::Transfer, common, [uid]);
        let report = self.execute_bulk(online, request).await?;

        Ok(ScanOutcome::Accepted {
            container: first_updated(report.updated, uid)?,
            path: report.path,
        })
    }

    /// `IN_STOCK` containers of a product, best candidates first.
    pub fn suggest_for_issue(
        &self,
        product_id: &str,
        warehouse_id: &str,
        limit: usize,
    ) -> SyncResult<Vec<Container>> {
        let mut candidates =
            self.containers
                .find_for_issue(product_id, warehouse_id, ContainerStatus::InStock)?;
        candidates.truncate(limit);
        Ok(candidates)
    }

    /// Containers in a warehouse, optionally narrowed to some statuses.
    pub fn list_containers(
        &self,
        warehouse_id: &str,
        statuses: &[ContainerStatus],
    ) -> SyncResult<Vec<Container>> {
        Ok(self.containers.find_by_warehouse(warehouse_id, statuses)?)
    }
}

pub(crate) fn first_updated(updated: Vec<Container>, uid: &str) -> SyncResult<Container> {
    updated
        .into_iter()
        .find(|c| c.uid == uid)
        .ok_or_else(|| SyncError::ContainerNotFound {
            uid: uid.to_string(),
        })
}
