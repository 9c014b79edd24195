//! Wine quality - model serving and offline training
//!
//! This crate provides:
//! - An HTTP service answering single-sample quality predictions
//! - A ridge regression grid-search job
//! - A standardized linear regression sweep job
//! - A local experiment tracker recording runs, metrics and artifacts
//!
//! # Modules
//!
//! ## Core
//! - [`features`] - Prediction request schema and validation
//! - [`preprocessing`] - Feature standardization
//! - [`training`] - Linear estimators, solvers, cross-validation, grid search
//! - [`inference`] - Serialized model artifacts
//!
//! ## Jobs
//! - [`jobs`] - The `tune` and `sweep` training jobs
//! - [`tracking`] - Experiment tracking
//!
//! ## Services
//! - [`server`] - HTTP server
//! - [`cli`] - Command-line interface
//!
//! ## Utilities
//! - [`utils`] - CSV loading

// Core error handling
pub mod error;

// Core ML modules
pub mod features;
pub mod preprocessing;
pub mod training;
pub mod inference;

// Jobs
pub mod jobs;
pub mod tracking;

// Utilities
pub mod utils;

// Services
pub mod server;
pub mod cli;

pub use error::{Result, WineError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, WineError};

    // Request schema
    pub use crate::features::{parse_features, FeatureError, FeatureVector, REQUIRED_FEATURES};

    // Preprocessing
    pub use crate::preprocessing::StandardScaler;

    // Training
    pub use crate::training::{
        Dataset, GridSearch, LinearRegression, ModelMetrics, ParamGrid, Regressor, RidgeRegression,
        RidgeSolver,
    };

    // Inference
    pub use crate::inference::{ModelArtifact, TrainedModel};

    // Jobs
    pub use crate::jobs::{run_grid_search, run_linear_sweep, JobConfig, SweepConfig};

    // Experiment tracking
    pub use crate::tracking::{Experiment, ExperimentTracker, Run, RunStatus};

    // Data loading
    pub use crate::utils::DataLoader;
}
