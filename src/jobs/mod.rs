//! Offline training jobs
//!
//! Each job is a straight-line batch run: load the CSV, split it with a fixed
//! seed, fit, evaluate on the held-out rows and record everything to the
//! experiment tracker. Any error aborts the job.

mod sweep;
mod tune;

pub use sweep::{run_linear_sweep, SweepConfig, SweepReport, SweepRunSummary, SWEEP_ARTIFACT, SWEEP_EXPERIMENT, SWEEP_SEED};
pub use tune::{run_grid_search, TuningReport, TUNE_ARTIFACT, TUNE_EXPERIMENT, TUNE_SEED};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default dataset location, relative to the working directory
pub const DEFAULT_DATA_PATH: &str = "winequality.csv";
/// Default tracking store root
pub const DEFAULT_TRACKING_DIR: &str = "mlruns";

/// Configuration shared by the training jobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// CSV dataset with a header row
    pub data_path: PathBuf,
    /// Root of the experiment tracking store
    pub tracking_dir: PathBuf,
    /// Experiment the runs are recorded under
    pub experiment: String,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the train/test shuffle and stochastic solvers
    pub seed: u64,
}

impl JobConfig {
    /// Base configuration, with paths taken from `DATA_PATH` / `TRACKING_DIR` when set
    pub fn new(experiment: impl Into<String>, seed: u64) -> Self {
        Self {
            data_path: std::env::var("DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_PATH)),
            tracking_dir: std::env::var("TRACKING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_TRACKING_DIR)),
            experiment: experiment.into(),
            test_size: 0.2,
            seed,
        }
    }

    /// Settings of the ridge grid-search job
    pub fn tune() -> Self {
        Self::new(TUNE_EXPERIMENT, TUNE_SEED)
    }

    /// Settings of the linear regression sweep job
    pub fn sweep() -> Self {
        Self::new(SWEEP_EXPERIMENT, SWEEP_SEED)
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn with_tracking_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tracking_dir = dir.into();
        self
    }

    pub fn with_experiment(mut self, experiment: impl Into<String>) -> Self {
        self.experiment = experiment.into();
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_presets() {
        let tune = JobConfig::tune();
        assert_eq!(tune.experiment, "hyperparameter_tuning");
        assert_eq!(tune.seed, 42);
        assert_eq!(tune.test_size, 0.2);

        let sweep = JobConfig::sweep().with_seed(7).with_data_path("other.csv");
        assert_eq!(sweep.experiment, "wine_quality_prediction");
        assert_eq!(sweep.seed, 7);
        assert_eq!(sweep.data_path, PathBuf::from("other.csv"));
    }
}
