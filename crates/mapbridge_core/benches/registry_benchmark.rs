//! # Registry Performance Benchmark
//!
//! Hot paths a host hits every frame:
//! - Resending an unchanged marker (idempotent update)
//! - Moving an existing marker
//! - Id lookups against a populated registry
//!
//! Run with: `cargo bench --package mapbridge_core`

// Benchmarks don't need strict docs
#![allow(missing_docs)]

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use mapbridge_core::registry::{MarkerEntry, Registry};
use mapbridge_core::surface::LayerId;
use mapbridge_core::{Bridge, BridgeConfig, RecordingSurface};
use mapbridge_shared::{
    EntityKind, LatLng, MapId, MapPosition, MapUpdate, MarkerId, MarkerUpdate,
};

/// Bridge with map 1 and `markers` markers already drawn.
fn populated_bridge(markers: u32) -> Bridge<RecordingSurface> {
    let bridge = Bridge::with_config(
        RecordingSurface::new(),
        BridgeConfig::default().with_settle_delay(Duration::ZERO),
    );
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");
    runtime
        .block_on(bridge.update_map(MapUpdate::new(MapId(1), MapPosition::default())))
        .expect("map");
    for id in 0..markers {
        bridge
            .update_marker(MarkerUpdate::new(
                MapId(1),
                MarkerId(id),
                LatLng::new(f64::from(id), 0.0),
            ))
            .expect("marker");
    }
    bridge
}

/// Benchmark: resending state the bridge already has.
fn bench_idempotent_update(c: &mut Criterion) {
    let bridge = populated_bridge(1);
    let update = MarkerUpdate::new(MapId(1), MarkerId(0), LatLng::new(0.0, 0.0));

    c.bench_function("update_marker_unchanged", |b| {
        b.iter(|| black_box(bridge.update_marker(black_box(update.clone()))));
    });
}

/// Benchmark: moving markers around a populated map.
fn bench_marker_moves(c: &mut Criterion) {
    let mut group = c.benchmark_group("update_marker_move");

    for size in [100u32, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let bridge = populated_bridge(size);
            let mut i = 0u32;
            b.iter(|| {
                let update = MarkerUpdate::new(
                    MapId(1),
                    MarkerId(i % size),
                    LatLng::new(f64::from(i % 90), f64::from(i % 180)),
                );
                i = i.wrapping_add(1);
                black_box(bridge.update_marker(update))
            });
        });
    }

    group.finish();
}

/// Benchmark: raw registry lookups.
fn bench_registry_lookup(c: &mut Criterion) {
    let mut registry: Registry<RecordingSurface> = Registry::new();
    for id in 0..10_000u32 {
        let applied = MarkerUpdate::new(MapId(id % 4), MarkerId(id), LatLng::default());
        registry.set_marker(MarkerId(id), MarkerEntry::new(LayerId(u64::from(id)), applied));
    }

    c.bench_function("registry_marker_lookup", |b| {
        let mut i = 0u32;
        b.iter(|| {
            i = (i + 7_919) % 10_000;
            black_box(registry.marker(MarkerId(i)).map(|entry| entry.map_id))
        });
    });

    c.bench_function("registry_contains_miss", |b| {
        b.iter(|| black_box(registry.contains(EntityKind::Marker, black_box(20_000))));
    });
}

criterion_group!(
    benches,
    bench_idempotent_update,
    bench_marker_moves,
    bench_registry_lookup,
);
criterion_main!(benches);
