use std::fmt::Write as _;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::TempDir;

const SPACING: f64 = 0.05;
const ROWS: usize = 361; // 40..58
const COLS: usize = 381; // -130..-111

/// Write a synthetic `g2018u1.asc` with a smooth undulation surface.
fn create_tile(dir: &std::path::Path) {
    let mut text = format!(
        "{:12.6} {:12.6} {:10.6} {:10.6} {:6} {:6} {:3}\n",
        40.0,
        230.0,
        SPACING,
        SPACING,
        ROWS,
        COLS,
        1
    );
    for i in 0..ROWS {
        let lat = 40.0 + i as f64 * SPACING;
        for j in 0..COLS {
            let lon = -130.0 + j as f64 * SPACING;
            let n = -20.0 + 3.0 * (lat * 0.3).sin() * (lon * 0.2).cos();
            write!(text, "{:.6} ", n).unwrap();
        }
        text.push('\n');
    }
    std::fs::write(dir.join("g2018u1.asc"), text).unwrap();
}

fn bench_single_cached(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    create_tile(tmp.path());
    let service = geoidkit::GeoidService::new(tmp.path(), 8);

    // Warm the cache
    let _ = service.undulation(46.0, -120.0);

    c.bench_function("single_undulation_cached", |b| {
        b.iter(|| {
            black_box(
                service
                    .undulation(black_box(46.722092), black_box(-119.593764))
                    .unwrap(),
            );
        });
    });
}

fn bench_batch_same_tile(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    create_tile(tmp.path());
    let service = geoidkit::GeoidService::new(tmp.path(), 8);

    let coords: Vec<(f64, f64)> = (0..1000)
        .map(|i| {
            let frac = i as f64 / 1000.0;
            (41.0 + frac * 16.0, -129.0 + frac * 17.0)
        })
        .collect();

    let _ = service.undulation(46.0, -120.0);

    c.bench_function("batch_1000_same_tile", |b| {
        b.iter(|| {
            black_box(service.undulations_batch(black_box(&coords)));
        });
    });
}

fn bench_height_conversion(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    create_tile(tmp.path());
    let service = geoidkit::GeoidService::new(tmp.path(), 8);

    let _ = service.undulation(46.0, -120.0);

    c.bench_function("geoid_from_ellipsoid_feet", |b| {
        b.iter(|| {
            black_box(
                service
                    .geoid_from_ellipsoid(
                        black_box(46.722092),
                        black_box(-119.593764),
                        black_box(250.0),
                        geoidkit::Units::SurveyFeet,
                    )
                    .unwrap(),
            );
        });
    });
}

fn bench_tile_load(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    create_tile(tmp.path());
    let path = tmp.path().join("g2018u1.asc");

    let mut group = c.benchmark_group("tile_load");
    group.sample_size(10);
    group.bench_function("parse_and_fit_361x381", |b| {
        b.iter(|| {
            black_box(geoidkit::GeoidTile::from_file(black_box(&path)).unwrap());
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_single_cached,
    bench_batch_same_tile,
    bench_height_conversion,
    bench_tile_load
);
criterion_main!(benches);
