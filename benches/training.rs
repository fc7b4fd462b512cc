use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use sketchml::data::{Point, TestPoint, TrainingRequest};
use sketchml::session::{dispatch, SessionEngine};
use sketchml::training::Algorithm;

/// Two noisy labeled blobs, or a noisy line for regression
fn create_points(algorithm: Algorithm, n_points: usize) -> Vec<Point> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    (0..n_points)
        .map(|i| {
            let class = (i % 2) as i64;
            let center = class as f64 * 4.0;
            let x = center + rng.gen::<f64>() * 3.0;
            let y = center + rng.gen::<f64>() * 3.0;
            match algorithm {
                Algorithm::LinearRegression => Point::new(x, 2.0 * x + rng.gen::<f64>()),
                Algorithm::KMeans => Point::new(x, y),
                _ => Point::labeled(x, y, class),
            }
        })
        .collect()
}

fn bench_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    group.sample_size(10);

    for algorithm in Algorithm::ALL {
        let points = create_points(algorithm, 60);
        let request = TrainingRequest::new(algorithm.as_str(), points);

        group.bench_with_input(
            BenchmarkId::new(algorithm.as_str(), request.points.len()),
            &request,
            |b, req| {
                b.iter(|| dispatch(algorithm, black_box(&req.points), &req.params).unwrap())
            },
        );
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    let engine = SessionEngine::default();
    for algorithm in [Algorithm::Svm, Algorithm::RandomForest, Algorithm::Knn] {
        let request =
            TrainingRequest::new(algorithm.as_str(), create_points(algorithm, 60));
        engine.retrain(algorithm.as_str(), &request).unwrap();

        group.bench_function(algorithm.as_str(), |b| {
            b.iter(|| {
                engine
                    .predict(algorithm.as_str(), black_box(&TestPoint { x: 3.5, y: 3.5 }))
                    .unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fit, bench_prediction);
criterion_main!(benches);
