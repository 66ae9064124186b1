use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use geoalign::{estimate, estimate_robust, CorrespondenceSet, RansacParams, SimilarityTransform};
use glam::{DMat3, DVec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn make_set(num_points: usize, outlier_ratio: f64) -> CorrespondenceSet {
    let mut rng = StdRng::seed_from_u64(0);
    let truth = SimilarityTransform::new(
        1.7,
        DMat3::from_rotation_x(0.2) * DMat3::from_rotation_z(1.3),
        DVec3::new(350.0, -20.0, 4.0),
    )
    .unwrap();

    let mut source = Vec::with_capacity(num_points);
    let mut target = Vec::with_capacity(num_points);
    for i in 0..num_points {
        let p = DVec3::new(
            rng.random_range(-100.0..100.0),
            rng.random_range(-100.0..100.0),
            rng.random_range(-10.0..10.0),
        );
        let mut q = truth.transform_point(p);
        if (i as f64) < outlier_ratio * num_points as f64 {
            q += DVec3::splat(rng.random_range(10.0..50.0));
        }
        source.push(p);
        target.push(q);
    }
    CorrespondenceSet::new(source, target).unwrap()
}

fn bench_estimate(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate");

    for num_points in [100, 1000, 10000].iter() {
        let set = make_set(*num_points, 0.0);
        group.bench_with_input(BenchmarkId::new("umeyama", num_points), &set, |b, set| {
            b.iter(|| black_box(estimate(black_box(set))))
        });
    }

    group.finish();
}

fn bench_estimate_robust(c: &mut Criterion) {
    let mut group = c.benchmark_group("estimate_robust");

    for num_points in [100, 1000].iter() {
        let set = make_set(*num_points, 0.4);
        for parallel in [false, true] {
            let params = RansacParams {
                inlier_threshold: 0.1,
                random_seed: Some(0),
                parallel,
                ..Default::default()
            };
            let name = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(name, num_points), &set, |b, set| {
                b.iter(|| black_box(estimate_robust(black_box(set), &params)))
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_estimate, bench_estimate_robust);
criterion_main!(benches);
