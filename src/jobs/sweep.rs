//! Standardized linear regression sweep job

use super::JobConfig;
use crate::error::Result;
use crate::features::{TARGET, WINE_TYPE};
use crate::inference::ModelArtifact;
use crate::preprocessing::StandardScaler;
use crate::tracking::ExperimentTracker;
use crate::training::{LinearRegression, ModelMetrics, Regressor};
use crate::utils::DataLoader;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

pub const SWEEP_EXPERIMENT: &str = "wine_quality_prediction";
pub const SWEEP_SEED: u64 = 10;
pub const SWEEP_ARTIFACT: &str = "linear_regression_model";

/// One estimator configuration of the sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepConfig {
    /// Explicitly set parameters, logged verbatim; empty means defaults
    pub params: BTreeMap<String, String>,
    pub fit_intercept: bool,
    pub copy_x: bool,
}

impl SweepConfig {
    /// Default, no intercept, and in-place centering
    pub fn standard() -> Vec<Self> {
        let defaults = Self {
            params: BTreeMap::new(),
            fit_intercept: true,
            copy_x: true,
        };
        vec![
            defaults.clone(),
            Self {
                params: BTreeMap::from([("fit_intercept".to_string(), "false".to_string())]),
                fit_intercept: false,
                ..defaults.clone()
            },
            Self {
                params: BTreeMap::from([("copy_X".to_string(), "false".to_string())]),
                copy_x: false,
                ..defaults
            },
        ]
    }

    fn estimator(&self) -> LinearRegression {
        LinearRegression::new()
            .with_fit_intercept(self.fit_intercept)
            .with_copy_x(self.copy_x)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepRunSummary {
    pub run_id: String,
    pub params: BTreeMap<String, String>,
    pub metrics: ModelMetrics,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub runs: Vec<SweepRunSummary>,
    pub feature_names: Vec<String>,
}

/// Fit every configuration on standardized features, one tracked run each
pub fn run_linear_sweep(config: &JobConfig, configs: &[SweepConfig]) -> Result<SweepReport> {
    let dataset = DataLoader::new()
        .load_dataset(&config.data_path, TARGET)?
        .drop_feature(WINE_TYPE)?;
    let split = dataset.train_test_split(config.test_size, config.seed)?;
    info!(
        train = split.x_train.nrows(),
        test = split.x_test.nrows(),
        features = dataset.n_features(),
        seed = config.seed,
        "Split dataset"
    );

    let tracker = ExperimentTracker::local(&config.tracking_dir, &config.experiment)?;
    let mut runs = Vec::with_capacity(configs.len());

    for sweep in configs {
        let (run, metrics) = tracker.run(None, |t| {
            t.log_params(sweep.params.clone())?;

            let mut scaler = StandardScaler::new();
            let mut x_train = scaler.fit_transform(&split.x_train)?;
            let x_test = scaler.transform(&split.x_test)?;

            let mut model = sweep.estimator();
            if model.copy_x {
                model.fit(&x_train, &split.y_train)?;
            } else {
                model.fit_in_place(&mut x_train, &split.y_train)?;
            }

            let y_pred = model.predict(&x_test)?;
            let metrics = ModelMetrics::compute_regression(&split.y_test, &y_pred);
            t.log_metrics(metrics.to_map(&["mse", "mae", "r2"]))?;

            let artifact =
                ModelArtifact::new(dataset.feature_names.clone(), model).with_scaler(scaler);
            t.log_model(SWEEP_ARTIFACT, &artifact)?;
            Ok(metrics)
        })?;

        info!(
            run_id = %run.run_id,
            mse = metrics.mse,
            mae = metrics.mae,
            r2 = metrics.r2,
            "Linear regression run recorded"
        );
        runs.push(SweepRunSummary {
            run_id: run.run_id,
            params: sweep.params.clone(),
            metrics,
        });
    }

    Ok(SweepReport {
        runs,
        feature_names: dataset.feature_names,
    })
}
