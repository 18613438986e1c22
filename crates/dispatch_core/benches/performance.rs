//! Matching and dispatch benchmarks using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dispatch_core::matching::{MatchingAlgorithm, NearestDriverMatching};
use dispatch_core::{
    CellIndexedDirectory, Coordinate, DispatchConfig, Dispatcher, DriverRecord, Order,
    SnapshotDirectory,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Drivers scattered over a ~40 km box around Manhattan.
fn city_drivers(count: usize, seed: u64) -> Vec<DriverRecord> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let location = Coordinate {
                latitude: rng.gen_range(40.55..40.90),
                longitude: rng.gen_range(-74.20..-73.75),
            };
            let driver = DriverRecord::new(format!("driver-{i}")).at(location);
            if rng.gen_bool(0.8) {
                driver.online()
            } else {
                driver
            }
        })
        .collect()
}

fn pickup() -> Coordinate {
    Coordinate {
        latitude: 40.7128,
        longitude: -74.0060,
    }
}

fn bench_nearest_matching(c: &mut Criterion) {
    let matcher = NearestDriverMatching::default();
    let mut group = c.benchmark_group("nearest_matching");
    for size in [100usize, 1_000, 10_000] {
        let drivers = city_drivers(size, 42);
        let refs: Vec<&DriverRecord> = drivers.iter().collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &refs, |b, refs| {
            b.iter(|| black_box(matcher.select_driver(&pickup(), refs, None)));
        });
    }
    group.finish();
}

fn bench_directory_prefilter(c: &mut Criterion) {
    let dispatcher = Dispatcher::from_config(&DispatchConfig::default()).expect("dispatcher");
    let drivers = city_drivers(10_000, 7);
    let snapshot = SnapshotDirectory::new(drivers.clone());
    let indexed = CellIndexedDirectory::new(drivers, Some(10)).expect("index");

    let mut group = c.benchmark_group("directory_10000_drivers");
    group.bench_function("snapshot", |b| {
        b.iter(|| black_box(dispatcher.select_driver(&snapshot, &pickup(), None)));
    });
    group.bench_function("cell_indexed_radius_10", |b| {
        b.iter(|| black_box(dispatcher.select_driver(&indexed, &pickup(), None)));
    });
    group.finish();
}

fn bench_assign_pending(c: &mut Criterion) {
    let dispatcher = Dispatcher::from_config(&DispatchConfig::default()).expect("dispatcher");
    let directory = SnapshotDirectory::new(city_drivers(1_000, 11));
    let dropoff = Coordinate {
        latitude: 40.7580,
        longitude: -73.9855,
    };
    let orders: Vec<Order> = (0..200)
        .map(|i| Order::new(format!("order-{i}"), pickup(), dropoff, "standard"))
        .collect();

    c.bench_function("assign_pending_200_orders", |b| {
        b.iter(|| {
            let mut batch = orders.clone();
            black_box(dispatcher.assign_pending(&mut batch, &directory))
        });
    });
}

criterion_group!(
    benches,
    bench_nearest_matching,
    bench_directory_prefilter,
    bench_assign_pending
);
criterion_main!(benches);
