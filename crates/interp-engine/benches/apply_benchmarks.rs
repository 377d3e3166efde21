//! Benchmarks for the interpolation hot paths.
//!
//! Run with: cargo bench --package interp-engine
//!
//! The apply path is the one that matters operationally: a table is built
//! once per source/target geometry but applied to every new value field.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use interp_engine::{
    GridDescriptor, GridFamily, InterpolationOptions, Mode, Raster, ScipyBackend,
};
use rand::Rng;

const EARTH: f64 = 6371000.0;

/// A source grid over a mid-latitude region with noisy field values.
fn source_grid(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut rng = rand::thread_rng();
    let mut lats = Vec::with_capacity(n * n);
    let mut lons = Vec::with_capacity(n * n);
    let mut values = Vec::with_capacity(n * n);
    let step = 10.0 / n as f64;
    for i in 0..n {
        for j in 0..n {
            lats.push(40.0 + i as f64 * step);
            lons.push(5.0 + j as f64 * step);
            values.push(273.15 + rng.gen_range(-30.0..30.0));
        }
    }
    (lats, lons, values)
}

/// A denser target grid over the same region, slightly offset.
fn target_grid(n: usize) -> (Raster, Raster) {
    let step = 10.0 / n as f64;
    let mut lats = Vec::with_capacity(n * n);
    let mut lons = Vec::with_capacity(n * n);
    for i in 0..n {
        for j in 0..n {
            lats.push(40.05 + i as f64 * step);
            lons.push(5.05 + j as f64 * step);
        }
    }
    (
        Raster::from_vec(lats, n, n).unwrap(),
        Raster::from_vec(lons, n, n).unwrap(),
    )
}

fn backend(mode: Mode, lats: &[f64], lons: &[f64], n: usize) -> ScipyBackend {
    let descriptor = GridDescriptor::new(
        GridFamily::RegularLl,
        EARTH,
        n * n,
        Some(n),
        n,
        5.0,
        15.0,
        f64::NAN,
    )
    .unwrap();
    let options = InterpolationOptions {
        mode,
        ..Default::default()
    };
    ScipyBackend::new(lats, lons, descriptor, &options).unwrap()
}

fn bench_apply(c: &mut Criterion) {
    let source_n = 100;
    let target_n = 200;
    let (lats, lons, values) = source_grid(source_n);
    let (target_lats, target_lons) = target_grid(target_n);

    let mut group = c.benchmark_group("apply");
    group.throughput(Throughput::Elements((target_n * target_n) as u64));

    for mode in [Mode::Nearest, Mode::Invdist] {
        let backend = backend(mode, &lats, &lons, source_n);
        let outcome = backend.build(&values, &target_lons, &target_lats).unwrap();
        group.bench_function(mode.as_str(), |b| {
            b.iter(|| {
                backend
                    .apply(
                        black_box(&outcome.table),
                        black_box(&values),
                        &target_lons,
                        &target_lats,
                    )
                    .unwrap()
            })
        });
    }
    group.finish();
}

fn bench_build(c: &mut Criterion) {
    let source_n = 100;
    let target_n = 100;
    let (lats, lons, values) = source_grid(source_n);
    let (target_lats, target_lons) = target_grid(target_n);

    let mut group = c.benchmark_group("build");
    group.sample_size(10);

    for mode in [Mode::Nearest, Mode::Invdist] {
        let backend = backend(mode, &lats, &lons, source_n);
        group.bench_function(mode.as_str(), |b| {
            b.iter(|| {
                backend
                    .build(black_box(&values), &target_lons, &target_lats)
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_apply, bench_build);
criterion_main!(benches);
