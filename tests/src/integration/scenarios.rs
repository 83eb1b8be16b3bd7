//! # Workflow Scenarios
//!
//! End-to-end runs of the basket workflows through the Sync Coordinator
//! with in-memory adapters:
//!
//! ```text
//! [scan] ──→ [Lifecycle validators] ──→ [Field Resolution]
//!                                            │
//!                     online ┌───────────────┴───────────────┐ offline / failure
//!                            ↓                               ↓
//!                      [Remote API]                     [Outbox Queue]
//!                            └───────────────┬───────────────┘
//!                                            ↓
//!                                    [Container Store] ──→ [Route Completion]
//! ```

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::timeout;

    use bt_01_container_store::{ContainerStore, InMemoryContainerStore, InMemoryRouteStore, RouteStore};
    use bt_02_outbox::{InMemoryOutbox, OperationType, OutboxQueue};
    use bt_03_field_resolution::{BasketUpdate, BulkUpdateRequest, CommonData, UpdateType};
    use bt_04_container_lifecycle::{validate_receiving, ScanValidation, ShippingScan};
    use bt_05_route_completion::recompute;
    use bt_06_sync_coordinator::{
        LoadingScanOutcome, MockRemoteApi, RemoteError, ScanOutcome, ShippingScanOutcome,
        StaticConnectivity, SyncConfig, SyncCoordinator, SyncDependencies, SyncPath,
    };
    use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, SyncEvent};
    use shared_types::{
        Container, ContainerStatus, LoadingItem, LoadingRoute, ManualTimeSource, RouteStatus,
    };

    type Coordinator = SyncCoordinator<
        InMemoryContainerStore,
        InMemoryRouteStore,
        InMemoryOutbox,
        MockRemoteApi,
        StaticConnectivity,
        ManualTimeSource,
    >;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    struct Site {
        coordinator: Coordinator,
        containers: Arc<InMemoryContainerStore>,
        routes: Arc<InMemoryRouteStore>,
        outbox: Arc<InMemoryOutbox>,
        remote: Arc<MockRemoteApi>,
        time: Arc<ManualTimeSource>,
        bus: Arc<InMemoryEventBus>,
    }

    fn site(online: bool, containers: Vec<Container>, config: SyncConfig) -> Site {
        let containers = Arc::new(InMemoryContainerStore::with_containers(containers));
        let routes = Arc::new(InMemoryRouteStore::new());
        let outbox = Arc::new(InMemoryOutbox::new());
        let remote = Arc::new(MockRemoteApi::new());
        let time = Arc::new(ManualTimeSource::new(1_700_000_000_000));
        let bus = Arc::new(InMemoryEventBus::new());

        let coordinator = SyncCoordinator::new(
            SyncDependencies {
                containers: containers.clone(),
                routes: routes.clone(),
                outbox: outbox.clone(),
                remote: remote.clone(),
                connectivity: Arc::new(StaticConnectivity::new(online)),
                time: time.clone(),
                bus: bus.clone(),
            },
            config,
        );

        Site {
            coordinator,
            containers,
            routes,
            outbox,
            remote,
            time,
            bus,
        }
    }

    fn basket(uid: &str, status: ContainerStatus) -> Container {
        Container::new(uid, 0).with_status(status)
    }

    fn in_stock(uid: &str, product: &str) -> Container {
        basket(uid, ContainerStatus::InStock)
            .with_warehouse("W1")
            .with_product(product)
            .with_quantity(40)
    }

    /// Strip the fields that legitimately differ between two runs.
    fn comparable(mut container: Container) -> Container {
        container.last_updated = 0;
        container
    }

    // =========================================================================
    // RECEIVING
    // =========================================================================

    /// X1 IN_PRODUCTION, no warehouse; offline receiving into W1 with 40 units.
    #[tokio::test]
    async fn test_offline_receiving_scenario() {
        let site = site(
            false,
            vec![basket("X1", ContainerStatus::InProduction)],
            SyncConfig::default(),
        );

        let outcome = site
            .coordinator
            .scan_receiving("X1", "W1", Some(40), None)
            .await
            .unwrap();
        assert!(matches!(outcome, ScanOutcome::Accepted { .. }));

        let pending = site.outbox.pending().unwrap();
        assert_eq!(pending.len(), 1, "exactly one deferred write");
        assert_eq!(pending[0].operation_type, OperationType::ReceivingUpdate);

        let x1 = site.containers.get("X1").unwrap().unwrap();
        assert_eq!(x1.status, ContainerStatus::InStock);
        assert_eq!(x1.warehouse_id.as_deref(), Some("W1"));
        assert_eq!(x1.quantity, 40);
    }

    /// The same update online and offline ends in the same container state.
    #[tokio::test]
    async fn test_offline_online_parity() {
        let online = site(
            true,
            vec![basket("X1", ContainerStatus::InProduction)],
            SyncConfig::default(),
        );
        let offline = site(
            false,
            vec![basket("X1", ContainerStatus::InProduction)],
            SyncConfig::default(),
        );

        for s in [&online, &offline] {
            s.coordinator
                .scan_receiving("X1", "W1", Some(40), Some("op"))
                .await
                .unwrap();
        }

        let a = comparable(online.containers.get("X1").unwrap().unwrap());
        let b = comparable(offline.containers.get("X1").unwrap().unwrap());
        assert_eq!(a, b);
        assert_eq!(online.outbox.count().unwrap(), 0);
        assert_eq!(offline.outbox.count().unwrap(), 1);
    }

    /// A failing server is indistinguishable from being offline, apart from
    /// the error carried on the queued path.
    #[tokio::test]
    async fn test_network_failure_parity() {
        let failing = site(
            true,
            vec![basket("X1", ContainerStatus::InProduction)],
            SyncConfig::default(),
        );
        failing.remote.fail_with(RemoteError::Network {
            message: "connection reset".into(),
        });
        let offline = site(
            false,
            vec![basket("X1", ContainerStatus::InProduction)],
            SyncConfig::default(),
        );

        for s in [&failing, &offline] {
            s.coordinator
                .scan_receiving("X1", "W1", Some(40), None)
                .await
                .unwrap();
        }

        assert_eq!(
            comparable(failing.containers.get("X1").unwrap().unwrap()),
            comparable(offline.containers.get("X1").unwrap().unwrap())
        );
        let failed = failing.outbox.pending().unwrap();
        let queued = offline.outbox.pending().unwrap();
        assert_eq!(failed[0].payload, queued[0].payload);
        assert_eq!(failed[0].target_key, queued[0].target_key);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_server_times_out_to_outbox() {
        let site = site(
            true,
            vec![basket("X1", ContainerStatus::InProduction)],
            SyncConfig::default().with_remote_timeout(Duration::from_millis(250)),
        );
        site.remote.stall_for(Duration::from_secs(60));

        let outcome = site
            .coordinator
            .scan_receiving("X1", "W1", None, None)
            .await
            .unwrap();

        match outcome {
            ScanOutcome::Accepted {
                path: Some(SyncPath::Queued { remote_error, .. }),
                ..
            } => assert_eq!(remote_error, Some(RemoteError::Timeout { after_ms: 250 })),
            other => panic!("expected queued acceptance, got {other:?}"),
        }
        assert_eq!(site.coordinator.pending_count().unwrap(), 1);
    }

    /// Every status other than IN_PRODUCTION is refused by receiving.
    #[tokio::test]
    async fn test_receiving_transition_guard() {
        for status in ContainerStatus::ALL {
            let validation = validate_receiving("X1", Some(basket("X1", status)));
            assert_eq!(
                validation.is_valid(),
                status == ContainerStatus::InProduction,
                "status {status}"
            );

            if status == ContainerStatus::InProduction {
                continue;
            }
            let site = site(false, vec![basket("X1", status)], SyncConfig::default());
            let outcome = site
                .coordinator
                .scan_receiving("X1", "W1", None, None)
                .await
                .unwrap();
            assert!(
                matches!(
                    outcome,
                    ScanOutcome::Rejected(ScanValidation::InvalidStatus { current, .. }) if current == status
                ),
                "status {status}"
            );
            assert_eq!(site.containers.get("X1").unwrap().unwrap().status, status);
            assert_eq!(site.outbox.count().unwrap(), 0);
        }
    }

    // =========================================================================
    // LOADING → SHIPPING
    // =========================================================================

    #[tokio::test]
    async fn test_two_basket_route_completes_then_verifies() {
        let site = site(
            false,
            vec![
                in_stock("X1", "P1"),
                in_stock("X2", "P1"),
                basket("U1", ContainerStatus::Unassigned),
                basket("S1", ContainerStatus::Shipped),
                in_stock("I1", "P1"),
            ],
            SyncConfig::default(),
        );
        site.routes
            .put_route(LoadingRoute::new("R1", vec![LoadingItem::new("P1", 2, 0)]))
            .unwrap();
        let mut route_events = site
            .bus
            .subscribe(EventFilter::topics(vec![EventTopic::Routes]));

        let first = site
            .coordinator
            .scan_loading("R1", "W1", "X1", None)
            .await
            .unwrap();
        let LoadingScanOutcome::Accepted { completion, .. } = first else {
            panic!("first basket rejected");
        };
        assert_eq!(completion.route.status, RouteStatus::InProgress);

        let second = site
            .coordinator
            .scan_loading("R1", "W1", "X2", None)
            .await
            .unwrap();
        let LoadingScanOutcome::Accepted { completion, .. } = second else {
            panic!("second basket rejected");
        };
        let item = &completion.route.items[0].completion;
        assert!(item.full_baskets_completed);
        assert!(item.loose_items_completed, "no loose quantity expected");
        assert_eq!(completion.route.status, RouteStatus::Completed);

        let progressed: Vec<RouteStatus> = std::iter::from_fn(|| route_events.try_recv().ok().flatten())
            .filter_map(|e| match e {
                SyncEvent::RouteProgressed { status, .. } => Some(status),
                _ => None,
            })
            .collect();
        assert_eq!(progressed, vec![RouteStatus::InProgress, RouteStatus::Completed]);

        // Shipping verification: expected, extra, duplicate, rejected.
        site.time.advance(5_000);
        let scan = |uid: &'static str| site.coordinator.scan_shipping("R1", uid);

        assert!(matches!(
            scan("X1").await.unwrap(),
            ShippingScanOutcome::Scanned(ShippingScan::Verified(_))
        ));
        assert!(matches!(
            scan("U1").await.unwrap(),
            ShippingScanOutcome::Scanned(ShippingScan::Extra(_))
        ));
        assert!(matches!(
            scan("S1").await.unwrap(),
            ShippingScanOutcome::Scanned(ShippingScan::Duplicate { .. })
        ));
        assert!(matches!(
            scan("I1").await.unwrap(),
            ShippingScanOutcome::Scanned(ShippingScan::Rejected(ScanValidation::InvalidStatus { .. }))
        ));
        assert!(matches!(
            scan("X2").await.unwrap(),
            ShippingScanOutcome::Scanned(ShippingScan::Verified(_))
        ));

        // Neither the duplicate nor the rejection touched stored state.
        assert_eq!(
            site.containers.get("S1").unwrap().unwrap().status,
            ContainerStatus::Shipped
        );
        assert_eq!(
            site.containers.get("I1").unwrap().unwrap().status,
            ContainerStatus::InStock
        );

        let report = site
            .coordinator
            .submit_shipping_verification("R1", Some("gate"))
            .await
            .unwrap();
        assert_eq!(report.completion.route.status, RouteStatus::Verified);
        let mut shipped: Vec<&str> = report.shipped.iter().map(|c| c.uid.as_str()).collect();
        shipped.sort_unstable();
        assert_eq!(shipped, vec!["U1", "X1", "X2"]);

        // Recompute never leaves VERIFIED.
        let after = site.coordinator.recompute_route("R1").await.unwrap();
        assert_eq!(after.route.status, RouteStatus::Verified);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut route = LoadingRoute::new(
            "R1",
            vec![LoadingItem::new("P1", 2, 0), LoadingItem::new("P2", 1, 7)],
        );
        route.items[0].completion.full_baskets_scanned = 2;
        route.items[1].completion.loose_scanned = 3;

        recompute(&mut route);
        let once = serde_json::to_vec(&route).unwrap();
        recompute(&mut route);
        let twice = serde_json::to_vec(&route).unwrap();

        assert_eq!(once, twice);
        assert_eq!(route.status, RouteStatus::InProgress);
    }

    #[tokio::test]
    async fn test_concurrent_loading_keeps_every_basket() {
        let uids: Vec<String> = (0..8).map(|i| format!("X{i}")).collect();
        let site = Arc::new(site(
            false,
            uids.iter().map(|u| in_stock(u, "P1")).collect(),
            SyncConfig::default(),
        ));
        site.routes
            .put_route(LoadingRoute::new("R1", vec![LoadingItem::new("P1", 8, 0)]))
            .unwrap();

        let handles: Vec<_> = uids
            .iter()
            .cloned()
            .map(|uid| {
                let site = Arc::clone(&site);
                tokio::spawn(async move {
                    site.coordinator
                        .scan_loading("R1", "W1", &uid, None)
                        .await
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            timeout(Duration::from_secs(5), handle)
                .await
                .expect("scan stalled")
                .unwrap();
        }

        let route = site.routes.get_route("R1").unwrap().unwrap();
        assert_eq!(route.items[0].completion.full_baskets_scanned, 8);
        assert_eq!(route.status, RouteStatus::Completed);
    }

    // =========================================================================
    // FIELD RESOLUTION THROUGH THE COORDINATOR
    // =========================================================================

    #[tokio::test]
    async fn test_clear_forces_reset_despite_overrides() {
        let site = site(false, vec![in_stock("X1", "P1")], SyncConfig::default());
        let request = BulkUpdateRequest::new(
            UpdateType::Clear,
            CommonData::default()
                .with_warehouse("W9")
                .with_quantity(12)
                .with_product("P2", "B2"),
        )
        .with_basket(
            BasketUpdate::new("X1")
                .with_status(ContainerStatus::InStock)
                .with_quantity(30),
        );

        let report = site.coordinator.apply_bulk_update(request).await.unwrap();

        assert_eq!(report.updated.len(), 1);
        let x1 = site.containers.get("X1").unwrap().unwrap();
        assert_eq!(x1.status, ContainerStatus::Unassigned);
        assert_eq!(x1.quantity, 0);
        assert!(x1.product_id.is_none());
        assert!(x1.batch_id.is_none());
        assert!(x1.warehouse_id.is_none());
    }

    #[tokio::test]
    async fn test_item_override_wins_over_common() {
        let site = site(
            false,
            vec![in_stock("X1", "P1"), in_stock("X2", "P1")],
            SyncConfig::default(),
        );
        let request = BulkUpdateRequest::new(
            UpdateType::Transfer,
            CommonData::default().with_warehouse("W2").with_quantity(10),
        )
        .with_basket(BasketUpdate::new("X1").with_warehouse("W3").with_quantity(25))
        .with_basket(BasketUpdate::new("X2"));

        site.coordinator.apply_bulk_update(request).await.unwrap();

        let x1 = site.containers.get("X1").unwrap().unwrap();
        let x2 = site.containers.get("X2").unwrap().unwrap();
        assert_eq!((x1.warehouse_id.as_deref(), x1.quantity), (Some("W3"), 25));
        assert_eq!((x2.warehouse_id.as_deref(), x2.quantity), (Some("W2"), 10));
    }

    #[tokio::test]
    async fn test_unparseable_status_keeps_current() {
        let site = site(false, vec![in_stock("X1", "P1")], SyncConfig::default());
        let mut basket = BasketUpdate::new("X1");
        basket.status = Some("MISPLACED".into());
        let request = BulkUpdateRequest::new(UpdateType::Transfer, CommonData::default())
            .with_basket(basket);

        let report = site.coordinator.apply_bulk_update(request).await.unwrap();

        assert_eq!(report.warnings.len(), 1);
        assert_eq!(
            site.containers.get("X1").unwrap().unwrap().status,
            ContainerStatus::InStock
        );
    }
}
