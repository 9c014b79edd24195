//! Ridge regression grid search job

use super::JobConfig;
use crate::error::Result;
use crate::features::TARGET;
use crate::inference::ModelArtifact;
use crate::training::{GridSearch, ModelMetrics, ParamGrid, Regressor, RidgeParams};
use crate::utils::DataLoader;
use crate::tracking::ExperimentTracker;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

pub const TUNE_EXPERIMENT: &str = "hyperparameter_tuning";
pub const TUNE_SEED: u64 = 42;
/// Artifact path of the refit winner inside the run
pub const TUNE_ARTIFACT: &str = "best_model";

/// Summary of a finished grid search run
#[derive(Debug, Clone, Serialize)]
pub struct TuningReport {
    pub run_id: String,
    pub best_params: RidgeParams,
    /// Mean cross-validated MSE of the winner (the negated search score)
    pub best_cv_mse: f64,
    pub test_mse: f64,
    pub test_r2: f64,
    pub n_candidates: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub artifact_path: PathBuf,
    #[serde(skip)]
    pub artifact: ModelArtifact,
}

/// Search the ridge grid, evaluate the refit winner and record one run
pub fn run_grid_search(config: &JobConfig) -> Result<TuningReport> {
    let dataset = DataLoader::new().load_dataset(&config.data_path, TARGET)?;
    let split = dataset.train_test_split(config.test_size, config.seed)?;
    info!(
        train = split.x_train.nrows(),
        test = split.x_test.nrows(),
        seed = config.seed,
        "Split dataset"
    );

    let tracker = ExperimentTracker::local(&config.tracking_dir, &config.experiment)?;
    let search = GridSearch::new(ParamGrid::default()).with_random_state(config.seed);

    let (run, report) = tracker.run(None, |t| {
        let result = search.fit(&split.x_train, &split.y_train)?;
        let y_pred = result.best_estimator.predict(&split.x_test)?;
        let metrics = ModelMetrics::compute_regression(&split.y_test, &y_pred);

        t.log_params(result.best_params.to_map())?;
        t.log_metrics(metrics.to_map(&["mse", "r2"]))?;

        let artifact = ModelArtifact::new(dataset.feature_names.clone(), result.best_estimator);
        let artifact_path = t.log_model(TUNE_ARTIFACT, &artifact)?;

        info!(
            alpha = result.best_params.alpha,
            fit_intercept = result.best_params.fit_intercept,
            solver = %result.best_params.solver,
            test_mse = metrics.mse,
            test_r2 = metrics.r2,
            "Best ridge configuration"
        );

        Ok(TuningReport {
            run_id: String::new(),
            best_params: result.best_params,
            best_cv_mse: -result.best_score,
            test_mse: metrics.mse,
            test_r2: metrics.r2,
            n_candidates: result.candidates.len(),
            n_train: split.x_train.nrows(),
            n_test: split.x_test.nrows(),
            artifact_path,
            artifact,
        })
    })?;

    Ok(TuningReport {
        run_id: run.run_id,
        ..report
    })
}
