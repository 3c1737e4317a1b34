//! Criterion benchmarks for the query engine.
//!
//! Measures nearest-neighbour, radius and routing latency across store and
//! network sizes to catch regressions in the index and search paths.
//!
//! Run benchmarks with:
//! ```bash
//! cargo bench --package waypost-core
//! ```

// Criterion macros generate code that triggers missing_docs warnings.
#![allow(missing_docs, reason = "Criterion macros generate undocumented code")]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use geo::Coord;
use waypost_core::test_support::{grid_network, point_feature};
use waypost_core::{
    Category, EngineConfig, GeoFeature, MemoryStore, QueryEngine, RoadNetwork, RoutingConfig,
    RoutingService,
};

/// Store sizes to benchmark.
const STORE_SIZES: &[u64] = &[1_000, 10_000, 50_000];

/// Grid side lengths for routing benchmarks.
const GRID_SIDES: &[u64] = &[10, 50, 100];

/// Spacing between generated features and grid vertices (degrees).
const SPACING: f64 = 0.000_5;

/// Lay `count` features on a square lattice, repeating every seventh
/// position so deduplication has work to do.
fn lattice_features(count: u64) -> Vec<GeoFeature> {
    let side = (1..).find(|s: &u64| s * s >= count).unwrap_or(1);
    (0..count)
        .map(|i| {
            let cell = if i % 7 == 0 { i.saturating_sub(1) } else { i };
            #[expect(clippy::cast_precision_loss, reason = "benchmark sizes stay small")]
            let (x, y) = ((cell % side) as f64 * SPACING, (cell / side) as f64 * SPACING);
            point_feature(i + 1, x, y, &[Category::Generic])
        })
        .collect()
}

fn engine(count: u64) -> QueryEngine<MemoryStore<GeoFeature>, RoadNetwork> {
    QueryEngine::new(
        MemoryStore::new(lattice_features(count)),
        RoadNetwork::empty(),
        EngineConfig::default(),
    )
    .expect("default config is valid")
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest");
    for &size in STORE_SIZES {
        let engine = engine(size);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("k10", size), &size, |b, _| {
            b.iter(|| engine.nearest(black_box(0.01), black_box(0.01), 10));
        });
    }
    group.finish();
}

fn bench_radius(c: &mut Criterion) {
    let mut group = c.benchmark_group("within_radius");
    for &size in STORE_SIZES {
        let engine = engine(size);
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("250m", size), &size, |b, _| {
            b.iter(|| engine.within_radius(black_box(0.01), black_box(0.01), 250.0));
        });
    }
    group.finish();
}

fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("route");
    for &side in GRID_SIDES {
        let network = grid_network(side, side, SPACING).expect("valid grid");
        #[expect(clippy::cast_precision_loss, reason = "grid sizes stay small")]
        let far = Coord {
            x: (side - 1) as f64 * SPACING,
            y: (side - 1) as f64 * SPACING,
        };
        let config = RoutingConfig::default();
        group.throughput(Throughput::Elements(side * side));
        group.bench_with_input(BenchmarkId::new("grid", side), &side, |b, _| {
            b.iter(|| network.route(black_box(Coord { x: 0.0, y: 0.0 }), far, &config));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_nearest, bench_radius, bench_routing);
criterion_main!(benches);
