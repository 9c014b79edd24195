//! Serialized model artifact

use crate::error::{Result, WineError};
use crate::features::REQUIRED_FEATURES;
use crate::preprocessing::StandardScaler;
use crate::training::{LinearRegression, Regressor, RidgeRegression};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Current on-disk layout version
pub const FORMAT_VERSION: u32 = 1;

/// File name used for artifacts stored by the experiment tracker
pub const ARTIFACT_FILE_NAME: &str = "model.json";

/// A fitted regressor of any supported family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrainedModel {
    Ridge(RidgeRegression),
    Linear(LinearRegression),
}

impl TrainedModel {
    pub fn name(&self) -> &'static str {
        match self {
            TrainedModel::Ridge(_) => "ridge",
            TrainedModel::Linear(_) => "linear",
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            TrainedModel::Ridge(m) => m.predict(x),
            TrainedModel::Linear(m) => m.predict(x),
        }
    }
}

impl From<RidgeRegression> for TrainedModel {
    fn from(model: RidgeRegression) -> Self {
        TrainedModel::Ridge(model)
    }
}

impl From<LinearRegression> for TrainedModel {
    fn from(model: LinearRegression) -> Self {
        TrainedModel::Linear(model)
    }
}

/// Everything needed to score an ordered feature vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Column order the model was fitted on
    pub feature_names: Vec<String>,
    /// Applied to each row before the model when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
    pub model: TrainedModel,
}

impl ModelArtifact {
    pub fn new(feature_names: Vec<String>, model: impl Into<TrainedModel>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            feature_names,
            scaler: None,
            model: model.into(),
        }
    }

    pub fn with_scaler(mut self, scaler: StandardScaler) -> Self {
        self.scaler = Some(scaler);
        self
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Save the artifact as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate an artifact
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            WineError::IoError(std::io::Error::new(
                e.kind(),
                format!("Failed to read model artifact {}: {}", path.display(), e),
            ))
        })?;
        let artifact: Self = serde_json::from_str(&json)?;
        artifact.validate()?;

        info!(
            path = %path.display(),
            model = artifact.model.name(),
            features = artifact.n_features(),
            scaled = artifact.scaler.is_some(),
            "Loaded model artifact"
        );
        Ok(artifact)
    }

    /// Check internal consistency of a deserialized artifact
    pub fn validate(&self) -> Result<()> {
        if self.format_version != FORMAT_VERSION {
            return Err(WineError::SerializationError(format!(
                "Unsupported artifact format_version {} (expected {})",
                self.format_version, FORMAT_VERSION
            )));
        }
        if let Some(n) = self.scaler.as_ref().and_then(|s| s.n_features()) {
            if n != self.n_features() {
                return Err(WineError::ShapeError {
                    expected: format!("{} scaler columns", self.n_features()),
                    actual: format!("{} scaler columns", n),
                });
            }
        }
        // a zero-row prediction catches unfitted models and coefficient length mismatches
        self.model.predict(&Array2::zeros((0, self.n_features())))?;
        Ok(())
    }

    /// Refuse artifacts whose feature layout differs from the request contract
    pub fn ensure_serving_contract(&self) -> Result<()> {
        let matches = self.feature_names.len() == REQUIRED_FEATURES.len()
            && self
                .feature_names
                .iter()
                .zip(REQUIRED_FEATURES.iter())
                .all(|(a, b)| a == b);

        if matches {
            Ok(())
        } else {
            Err(WineError::IncompatibleArtifact {
                expected: REQUIRED_FEATURES.join(", "),
                actual: self.feature_names.join(", "),
            })
        }
    }

    /// Score one sample given in `feature_names` order
    pub fn predict_row(&self, row: &[f64]) -> Result<f64> {
        if row.len() != self.n_features() {
            return Err(WineError::ShapeError {
                expected: format!("{} features", self.n_features()),
                actual: format!("{} features", row.len()),
            });
        }

        let mut values = row.to_vec();
        if let Some(scaler) = &self.scaler {
            scaler.transform_row(&mut values)?;
        }
        let x = Array2::from_shape_vec((1, values.len()), values)?;
        let prediction = self.model.predict(&x)?;
        prediction
            .first()
            .copied()
            .ok_or_else(|| WineError::ComputationError("Model returned no prediction".to_string()))
    }
}
