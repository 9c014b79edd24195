use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use winequality::inference::ModelArtifact;
use winequality::training::{
    GridSearch, ParamGrid, Regressor, RidgeRegression, RidgeSolver,
};

fn create_regression_data(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>() * 10.0);
    // target is the feature sum plus noise
    let y = x.rows().into_iter().map(|row| row.sum() + rng.gen::<f64>() * 0.1).collect();
    (x, y)
}

fn bench_ridge_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("ridge_fit");
    group.sample_size(10);
    let (x, y) = create_regression_data(2000, 12);

    for solver in RidgeSolver::ALL {
        group.bench_with_input(BenchmarkId::from_parameter(solver), &solver, |b, &solver| {
            b.iter(|| {
                let mut model = RidgeRegression::new(1.0).with_solver(solver);
                model.fit(black_box(&x), black_box(&y)).unwrap();
                model
            })
        });
    }

    group.finish();
}

fn bench_grid_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid_search");
    group.sample_size(10);

    for n_rows in [500, 2000].iter() {
        let (x, y) = create_regression_data(*n_rows, 12);
        group.bench_with_input(BenchmarkId::new("fit", n_rows), &(x, y), |b, (x, y)| {
            b.iter(|| {
                GridSearch::new(ParamGrid::default())
                    .with_random_state(42)
                    .fit(black_box(x), black_box(y))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_predict_row(c: &mut Criterion) {
    let (x, y) = create_regression_data(1000, 12);
    let mut model = RidgeRegression::new(1.0);
    model.fit(&x, &y).unwrap();
    let names = (0..12).map(|i| format!("feature_{}", i)).collect();
    let artifact = ModelArtifact::new(names, model);
    let row = x.row(0).to_vec();

    c.bench_function("predict_row", |b| {
        b.iter(|| artifact.predict_row(black_box(&row)).unwrap())
    });
}

criterion_group!(benches, bench_ridge_solvers, bench_grid_search, bench_predict_row);
criterion_main!(benches);
