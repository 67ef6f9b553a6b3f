//! Benchmarks for haversine distance calculations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use freshcart_geo::{haversine_distance, Coordinate};

fn create_points(count: usize) -> Vec<Coordinate> {
    (0..count)
        .map(|i| {
            // Grid of sellers around Metro Manila
            let lat = 14.4 + (i as f64 * 0.001) % 0.4;
            let lng = 120.9 + (i as f64 * 0.0007) % 0.3;
            Coordinate::new(lat, lng)
        })
        .collect()
}

fn bench_single_distance(c: &mut Criterion) {
    let buyer = Coordinate::new(14.5995, 120.9842);
    let seller = Coordinate::new(14.6760, 121.0437);

    c.bench_function("haversine_single", |b| {
        b.iter(|| haversine_distance(black_box(&buyer), black_box(&seller)))
    });
}

fn bench_many_distances(c: &mut Criterion) {
    let mut group = c.benchmark_group("haversine_many");
    let buyer = Coordinate::new(14.5995, 120.9842);

    for size in [10, 100, 1000, 10000].iter() {
        let points = create_points(*size);

        group.bench_with_input(BenchmarkId::new("sequential", size), size, |b, _| {
            b.iter(|| {
                points
                    .iter()
                    .map(|p| haversine_distance(black_box(&buyer), p))
                    .sum::<f64>()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_distance, bench_many_distances);
criterion_main!(benches);
