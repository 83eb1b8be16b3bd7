//! # Basket Engine Benchmarks
//!
//! Hot paths a handheld scanner exercises on every read:
//!
//! | Path | Target |
//! |------|--------|
//! | Field resolution, 500-basket bulk update | < 5ms |
//! | Route recompute, 50 items | < 50μs |
//! | Issue query over 10k containers | < 10ms |
//! | Offline receiving scan, end to end | < 1ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use bt_01_container_store::{ContainerStore, InMemoryContainerStore, InMemoryRouteStore};
use bt_02_outbox::InMemoryOutbox;
use bt_03_field_resolution::{resolve_batch, BulkUpdateRequest, CommonData, UpdateType};
use bt_05_route_completion::recompute;
use bt_06_sync_coordinator::{
    MockRemoteApi, StaticConnectivity, SyncConfig, SyncCoordinator, SyncDependencies,
};
use shared_bus::InMemoryEventBus;
use shared_types::{
    Container, ContainerStatus, LoadingItem, LoadingRoute, ManualTimeSource,
};

fn random_containers(count: usize) -> Vec<Container> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            Container::new(format!("X{i:05}"), rng.gen_range(0..1_000_000))
                .with_status(ContainerStatus::InStock)
                .with_warehouse(format!("W{}", rng.gen_range(0..4)))
                .with_product(format!("P{}", rng.gen_range(0..20)))
                .with_quantity(rng.gen_range(0..60))
        })
        .collect()
}

// ============================================================================
// BT-03: Field Resolution
// ============================================================================

fn bench_field_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("bt-03-field-resolution");

    for size in [10usize, 100, 500] {
        let existing = random_containers(size);
        let request = BulkUpdateRequest::for_uids(
            UpdateType::Transfer,
            CommonData::default().with_warehouse("W9").with_quantity(12),
            existing.iter().map(|c| c.uid.clone()),
        );

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("resolve_batch", size),
            &(request, existing),
            |b, (request, existing)| {
                b.iter(|| {
                    let batch = resolve_batch(
                        request,
                        |uid| existing.iter().find(|c| c.uid == uid).cloned(),
                        1,
                    )
                    .unwrap();
                    black_box(batch.resolved.len())
                })
            },
        );
    }

    group.finish();
}

// ============================================================================
// BT-05: Route Completion
// ============================================================================

fn bench_route_recompute(c: &mut Criterion) {
    let mut group = c.benchmark_group("bt-05-route-completion");
    let mut rng = rand::thread_rng();

    for items in [5usize, 50] {
        let mut route = LoadingRoute::new(
            "R1",
            (0..items)
                .map(|i| LoadingItem::new(format!("P{i}"), rng.gen_range(0..6), rng.gen_range(0..20)))
                .collect(),
        );
        for item in &mut route.items {
            item.completion.full_baskets_scanned = rng.gen_range(0..6);
            item.completion.loose_scanned = rng.gen_range(0..20);
        }

        group.bench_with_input(BenchmarkId::new("recompute", items), &route, |b, route| {
            b.iter(|| {
                let mut route = route.clone();
                recompute(&mut route);
                black_box(route.status)
            })
        });
    }

    group.finish();
}

// ============================================================================
// BT-01: Container Store
// ============================================================================

fn bench_store_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("bt-01-container-store");
    group.measurement_time(Duration::from_secs(5));

    let store = InMemoryContainerStore::with_containers(random_containers(10_000));

    group.bench_function("find_for_issue_10k", |b| {
        b.iter(|| {
            black_box(
                store
                    .find_for_issue("P7", "W1", ContainerStatus::InStock)
                    .unwrap()
                    .len(),
            )
        })
    });

    group.bench_function("find_by_warehouse_10k", |b| {
        b.iter(|| black_box(store.find_by_warehouse("W2", &[]).unwrap().len()))
    });

    group.finish();
}

// ============================================================================
// BT-06: Offline Scan Path
// ============================================================================

fn bench_offline_receiving(c: &mut Criterion) {
    let mut group = c.benchmark_group("bt-06-sync-coordinator");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();

    group.bench_function("scan_receiving_offline", |b| {
        b.iter_batched(
            || {
                SyncCoordinator::new(
                    SyncDependencies {
                        containers: Arc::new(InMemoryContainerStore::with_containers([
                            Container::new("X1", 0).with_status(ContainerStatus::InProduction),
                        ])),
                        routes: Arc::new(InMemoryRouteStore::new()),
                        outbox: Arc::new(InMemoryOutbox::new()),
                        remote: Arc::new(MockRemoteApi::new()),
                        connectivity: Arc::new(StaticConnectivity::offline()),
                        time: Arc::new(ManualTimeSource::new(0)),
                        bus: Arc::new(InMemoryEventBus::new()),
                    },
                    SyncConfig::default(),
                )
            },
            |coordinator| {
                runtime.block_on(async {
                    black_box(
                        coordinator
                            .scan_receiving("X1", "W1", Some(40), None)
                            .await
                            .unwrap(),
                    )
                })
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_field_resolution,
    bench_route_recompute,
    bench_store_queries,
    bench_offline_receiving,
);

criterion_main!(benches);
