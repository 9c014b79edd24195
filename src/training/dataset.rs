//! In-memory training data and the seeded train/test partition

use crate::error::{Result, WineError};
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Feature matrix with named columns plus its regression target
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub features: Array2<f64>,
    pub target: Array1<f64>,
}

/// Result of [`Dataset::train_test_split`]
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

impl Dataset {
    pub fn new(feature_names: Vec<String>, features: Array2<f64>, target: Array1<f64>) -> Result<Self> {
        if features.ncols() != feature_names.len() {
            return Err(WineError::ShapeError {
                expected: format!("{} feature columns", feature_names.len()),
                actual: format!("{} feature columns", features.ncols()),
            });
        }
        if features.nrows() != target.len() {
            return Err(WineError::ShapeError {
                expected: format!("{} target values", features.nrows()),
                actual: format!("{} target values", target.len()),
            });
        }
        Ok(Self {
            feature_names,
            features,
            target,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.features.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Remove a feature column by name
    pub fn drop_feature(mut self, name: &str) -> Result<Self> {
        let idx = self
            .feature_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| WineError::FeatureNotFound(name.to_string()))?;

        self.features.remove_index(Axis(1), idx);
        self.feature_names.remove(idx);
        Ok(self)
    }

    /// Shuffle rows with a seeded ChaCha8 stream and hold out `ceil(test_size * n)` of them.
    ///
    /// The same seed always yields the same partition for a given dataset.
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(WineError::InvalidParameter {
                name: "test_size".to_string(),
                value: test_size.to_string(),
                reason: "must be strictly between 0 and 1".to_string(),
            });
        }

        let n = self.n_samples();
        let n_test = (test_size * n as f64).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(WineError::DataError(format!(
                "Cannot split {} samples with test_size {}",
                n, test_size
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
        let (test_idx, train_idx) = indices.split_at(n_test);

        Ok(TrainTestSplit {
            x_train: self.features.select(Axis(0), train_idx),
            x_test: self.features.select(Axis(0), test_idx),
            y_train: self.target.select(Axis(0), train_idx),
            y_test: self.target.select(Axis(0), test_idx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn dataset(n: usize) -> Dataset {
        let features = Array::from_shape_fn((n, 3), |(r, c)| (r * 3 + c) as f64);
        let target = Array::from_iter((0..n).map(|r| r as f64));
        Dataset::new(vec!["a".into(), "b".into(), "c".into()], features, target).unwrap()
    }

    #[test]
    fn test_split_sizes() {
        let split = dataset(101).train_test_split(0.2, 42).unwrap();
        assert_eq!(split.x_test.nrows(), 21);
        assert_eq!(split.x_train.nrows(), 80);
        assert_eq!(split.y_train.len(), 80);
    }

    #[test]
    fn test_split_is_deterministic() {
        let data = dataset(50);
        let a = data.train_test_split(0.2, 42).unwrap();
        let b = data.train_test_split(0.2, 42).unwrap();
        let c = data.train_test_split(0.2, 10).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.y_test, c.y_test);
    }

    #[test]
    fn test_split_keeps_rows_aligned() {
        let split = dataset(30).train_test_split(0.3, 1).unwrap();
        for (row, y) in split.x_train.rows().into_iter().zip(split.y_train.iter()) {
            assert_eq!(row[0], y * 3.0);
        }
    }

    #[test]
    fn test_drop_feature() {
        let data = dataset(4).drop_feature("b").unwrap();
        assert_eq!(data.feature_names, vec!["a".to_string(), "c".to_string()]);
        assert_eq!(data.features.row(1).to_vec(), vec![3.0, 5.0]);
        assert!(matches!(
            data.drop_feature("missing"),
            Err(WineError::FeatureNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_test_size() {
        assert!(dataset(10).train_test_split(0.0, 1).is_err());
        assert!(dataset(10).train_test_split(1.0, 1).is_err());
    }
}
