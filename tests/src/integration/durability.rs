//! # Durability Across Restarts
//!
//! A device loses power with writes still queued. On restart the container
//! store and the outbox must reopen with exactly the state that was reported
//! as saved, and replay acknowledgements must survive as well.

#[cfg(test)]
mod tests {
    use std::fs::OpenOptions;
    use std::io::Write;
    use std::path::Path;
    use std::sync::Arc;

    use bt_01_container_store::{
        ContainerStore, FileBackedContainerStore, FileBackedRouteStore, RouteStore,
    };
    use bt_02_outbox::{FileBackedOutbox, OperationType, OutboxQueue};
    use bt_06_sync_coordinator::{
        MockRemoteApi, ScanOutcome, StaticConnectivity, SyncConfig, SyncCoordinator,
        SyncDependencies,
    };
    use shared_bus::InMemoryEventBus;
    use shared_types::{Container, ContainerStatus, ManualTimeSource, SystemTimeSource};
    use tempfile::tempdir;

    type DurableCoordinator<T> = SyncCoordinator<
        FileBackedContainerStore,
        FileBackedRouteStore,
        FileBackedOutbox,
        MockRemoteApi,
        StaticConnectivity,
        T,
    >;

    fn boot<T: shared_types::TimeSource>(
        dir: &Path,
        time: T,
    ) -> (DurableCoordinator<T>, Arc<FileBackedContainerStore>, Arc<FileBackedOutbox>) {
        let containers = Arc::new(FileBackedContainerStore::open(dir.join("containers.json")).unwrap());
        let outbox = Arc::new(FileBackedOutbox::open(dir.join("outbox.jsonl")).unwrap());
        let coordinator = SyncCoordinator::new(
            SyncDependencies {
                containers: containers.clone(),
                routes: Arc::new(FileBackedRouteStore::open(dir.join("routes.json")).unwrap()),
                outbox: outbox.clone(),
                remote: Arc::new(MockRemoteApi::new()),
                connectivity: Arc::new(StaticConnectivity::offline()),
                time: Arc::new(time),
                bus: Arc::new(InMemoryEventBus::new()),
            },
            SyncConfig::default(),
        );
        (coordinator, containers, outbox)
    }

    #[tokio::test]
    async fn test_queued_receiving_survives_restart() {
        let dir = tempdir().unwrap();
        {
            let (coordinator, containers, _) = boot(dir.path(), ManualTimeSource::new(10));
            containers
                .upsert_many(vec![
                    Container::new("X1", 0).with_status(ContainerStatus::InProduction),
                    Container::new("X2", 0).with_status(ContainerStatus::InProduction),
                ])
                .unwrap();

            for uid in ["X1", "X2"] {
                let outcome = coordinator
                    .scan_receiving(uid, "W1", Some(40), None)
                    .await
                    .unwrap();
                assert!(matches!(outcome, ScanOutcome::Accepted { .. }));
            }
        }

        let (coordinator, containers, outbox) = boot(dir.path(), SystemTimeSource);

        assert_eq!(coordinator.pending_count().unwrap(), 2);
        let pending = outbox.pending().unwrap();
        assert_eq!(pending[0].target_key, "X1");
        assert_eq!(pending[1].target_key, "X2");
        assert!(pending
            .iter()
            .all(|op| op.operation_type == OperationType::ReceivingUpdate));
        assert!(pending[0].sequence < pending[1].sequence);

        let x2 = containers.get("X2").unwrap().unwrap();
        assert_eq!(x2.status, ContainerStatus::InStock);
        assert_eq!(x2.quantity, 40);
    }

    #[tokio::test]
    async fn test_acknowledgements_survive_restart() {
        let dir = tempdir().unwrap();
        let acknowledged = {
            let (coordinator, containers, outbox) = boot(dir.path(), ManualTimeSource::new(10));
            containers
                .upsert(Container::new("X1", 0).with_status(ContainerStatus::InStock))
                .unwrap();
            coordinator.mark_sampling("X1", Some("qa")).await.unwrap();
            coordinator
                .clear_containers(&["X1".to_string()], None)
                .await
                .unwrap();

            let first = outbox.pending().unwrap()[0].operation_id;
            assert!(coordinator.acknowledge(first).await.unwrap());
            first
        };

        let (coordinator, containers, outbox) = boot(dir.path(), ManualTimeSource::new(20));

        let pending = outbox.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_ne!(pending[0].operation_id, acknowledged);
        assert_eq!(pending[0].operation_type, OperationType::ClearUpdate);
        assert!(!coordinator.acknowledge(acknowledged).await.unwrap());
        assert_eq!(
            containers.get("X1").unwrap().unwrap().status,
            ContainerStatus::Unassigned
        );
    }

    #[tokio::test]
    async fn test_torn_outbox_tail_is_dropped_on_restart() {
        let dir = tempdir().unwrap();
        {
            let (coordinator, containers, _) = boot(dir.path(), ManualTimeSource::new(10));
            containers
                .upsert(Container::new("X1", 0).with_status(ContainerStatus::InProduction))
                .unwrap();
            coordinator
                .scan_receiving("X1", "W1", None, None)
                .await
                .unwrap();
        }

        // Power loss in the middle of the next append.
        let mut journal = OpenOptions::new()
            .append(true)
            .open(dir.path().join("outbox.jsonl"))
            .unwrap();
        journal.write_all(br#"{"kind":"enqueue","sequ"#).unwrap();
        drop(journal);

        let (coordinator, containers, _) = boot(dir.path(), ManualTimeSource::new(20));
        assert_eq!(coordinator.pending_count().unwrap(), 1);

        containers
            .upsert(Container::new("X2", 0).with_status(ContainerStatus::InProduction))
            .unwrap();
        coordinator
            .scan_receiving("X2", "W1", None, None)
            .await
            .unwrap();
        assert_eq!(coordinator.pending_count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_routes_persist_progress() {
        let dir = tempdir().unwrap();
        let routes_path = dir.path().join("routes.json");
        {
            let routes = FileBackedRouteStore::open(&routes_path).unwrap();
            routes
                .put_route(shared_types::LoadingRoute::new(
                    "R1",
                    vec![shared_types::LoadingItem::new("P1", 1, 0)],
                ))
                .unwrap();
        }
        {
            let (coordinator, containers, _) = boot(dir.path(), ManualTimeSource::new(10));
            containers
                .upsert(
                    Container::new("X1", 0)
                        .with_status(ContainerStatus::InStock)
                        .with_warehouse("W1")
                        .with_product("P1"),
                )
                .unwrap();
            coordinator
                .scan_loading("R1", "W1", "X1", None)
                .await
                .unwrap();
        }

        let routes = FileBackedRouteStore::open(&routes_path).unwrap();
        let route = routes.get_route("R1").unwrap().unwrap();
        assert_eq!(route.status, shared_types::RouteStatus::Completed);
        assert!(route.items[0].completion.contributing_uids.contains("X1"));
    }
}
