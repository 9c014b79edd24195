//! Model artifacts and single-sample inference
//!
//! A [`ModelArtifact`] bundles everything needed to turn an ordered feature
//! vector into a quality score: the feature names it was trained on, an
//! optional fitted scaler, and the fitted regressor. Artifacts are written by
//! the training jobs and loaded once by the HTTP service.

mod artifact;

pub use artifact::{ModelArtifact, TrainedModel, ARTIFACT_FILE_NAME, FORMAT_VERSION};
