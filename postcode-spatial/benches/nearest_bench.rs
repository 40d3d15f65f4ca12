//! Spatial store benchmarks.
//!
//! Measures:
//! - Build time (postcodes and area boundaries → cell indexes)
//! - Nearest-candidate latency at increasing density
//! - Containment and prefix scan latency

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geo_types::Point;
use postcode_spatial::{
    Area, Generation, Postcode, SpatialSnapshot, SpatialSnapshotBuilder, StoreConfig, Validity,
};

// ============================================================================
// Test Data Generation
// ============================================================================

/// Generate a square polygon at a given center with size in degrees.
fn generate_polygon(center_lat: f64, center_lng: f64, size_deg: f64) -> String {
    let half = size_deg / 2.0;
    format!(
        "POLYGON(({} {}, {} {}, {} {}, {} {}, {} {}))",
        center_lng - half,
        center_lat - half,
        center_lng + half,
        center_lat - half,
        center_lng + half,
        center_lat + half,
        center_lng - half,
        center_lat + half,
        center_lng - half,
        center_lat - half,
    )
}

/// Postcodes on a regular lattice around a center, with synthetic codes.
fn generate_postcodes(count: usize, center_lat: f64, center_lng: f64, spread_deg: f64) -> Vec<Postcode> {
    let sqrt_count = (count as f64).sqrt().ceil() as usize;
    let step = spread_deg / sqrt_count as f64;

    (0..count)
        .map(|i| {
            let row = i / sqrt_count;
            let col = i % sqrt_count;
            let lat = center_lat - spread_deg / 2.0 + row as f64 * step;
            let lng = center_lng - spread_deg / 2.0 + col as f64 * step;
            Postcode::new(format!("B{i:06}"), Some(Point::new(lng, lat)), Validity::since(1))
        })
        .collect()
}

fn build_snapshot(postcodes: &[Postcode], areas: usize) -> SpatialSnapshot {
    let mut builder = SpatialSnapshotBuilder::new(StoreConfig::default());
    builder
        .add_generation(Generation::new(1, true, "bench"))
        .unwrap();

    for postcode in postcodes {
        builder.add_postcode(postcode.clone()).unwrap();
    }

    let side = (areas as f64).sqrt().ceil() as usize;
    for i in 0..areas {
        let lat = 52.0 + (i / side) as f64 * 0.05;
        let lng = -1.9 + (i % side) as f64 * 0.05;
        let wkt = generate_polygon(lat, lng, 0.05);
        builder
            .add_area(
                Area::new(i as u32 + 1, format!("Ward {i}"), "MTW", Validity::since(1)),
                Some(&wkt),
            )
            .unwrap();
    }

    builder.build().unwrap()
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_snapshot");

    for count in [1_000, 10_000, 100_000] {
        let postcodes = generate_postcodes(count, 52.48, -1.89, 0.5);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("postcodes", count), &postcodes, |b, pcs| {
            b.iter(|| black_box(build_snapshot(pcs, 100).postcode_count()));
        });
    }

    group.finish();
}

fn bench_nearest(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_candidates");

    for count in [1_000, 10_000, 100_000] {
        let snapshot = build_snapshot(&generate_postcodes(count, 52.48, -1.89, 0.5), 0);
        let inside = Point::new(-1.89, 52.48);
        let outside = Point::new(-3.0, 51.0);

        group.bench_with_input(BenchmarkId::new("inside_k100", count), &snapshot, |b, s| {
            b.iter(|| black_box(s.nearest_candidates(&inside, 100, 1).len()));
        });
        group.bench_with_input(BenchmarkId::new("outside_k100", count), &snapshot, |b, s| {
            b.iter(|| black_box(s.nearest_candidates(&outside, 100, 1).len()));
        });
    }

    group.finish();
}

fn bench_lookups(c: &mut Criterion) {
    let snapshot = build_snapshot(&generate_postcodes(10_000, 52.48, -1.89, 0.5), 400);
    let point = Point::new(-1.81, 52.13);

    let mut group = c.benchmark_group("lookups");
    group.bench_function("areas_containing", |b| {
        b.iter(|| black_box(snapshot.areas_containing(&point, 1).len()));
    });
    group.bench_function("postcode_locations", |b| {
        b.iter(|| black_box(snapshot.postcode_locations("B001", 7, 1).len()));
    });
    group.finish();
}

criterion_group!(benches, bench_build, bench_nearest, bench_lookups);
criterion_main!(benches);
