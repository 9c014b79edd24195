//! Feature standardization

use crate::error::{Result, WineError};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

/// Z-score scaler: `(x - mean) / std`, with population standard deviation.
///
/// Columns with zero variance keep a scale of 1 so they pass through
/// centered but otherwise unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Option<Array1<f64>>,
    pub scale: Option<Array1<f64>>,
    pub is_fitted: bool,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    pub fn new() -> Self {
        Self {
            mean: None,
            scale: None,
            is_fitted: false,
        }
    }

    /// Learn per-column mean and standard deviation
    pub fn fit(&mut self, x: &Array2<f64>) -> Result<&mut Self> {
        if x.nrows() == 0 {
            return Err(WineError::DataError(
                "Cannot fit scaler on an empty matrix".to_string(),
            ));
        }

        let mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| WineError::DataError("Empty feature matrix".to_string()))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 || !s.is_finite() { 1.0 } else { s });

        self.mean = Some(mean);
        self.scale = Some(scale);
        self.is_fitted = true;
        Ok(self)
    }

    /// Apply the fitted scaling
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        let (mean, scale) = self.params()?;
        if x.ncols() != mean.len() {
            return Err(WineError::ShapeError {
                expected: format!("{} columns", mean.len()),
                actual: format!("{} columns", x.ncols()),
            });
        }

        Ok((x - &mean.view().insert_axis(Axis(0))) / &scale.view().insert_axis(Axis(0)))
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.fit(x)?;
        self.transform(x)
    }

    /// Scale a single sample in place
    pub fn transform_row(&self, row: &mut [f64]) -> Result<()> {
        let (mean, scale) = self.params()?;
        if row.len() != mean.len() {
            return Err(WineError::ShapeError {
                expected: format!("{} features", mean.len()),
                actual: format!("{} features", row.len()),
            });
        }
        for ((v, m), s) in row.iter_mut().zip(mean.iter()).zip(scale.iter()) {
            *v = (*v - m) / s;
        }
        Ok(())
    }

    pub fn n_features(&self) -> Option<usize> {
        self.mean.as_ref().map(|m| m.len())
    }

    fn params(&self) -> Result<(&Array1<f64>, &Array1<f64>)> {
        match (&self.mean, &self.scale) {
            (Some(mean), Some(scale)) if self.is_fitted => Ok((mean, scale)),
            _ => Err(WineError::ModelNotFitted),
        }
    }
}
