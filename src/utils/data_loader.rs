//! Data loading utilities

use crate::error::{Result, WineError};
use crate::training::Dataset;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// CSV loader producing numeric [`Dataset`]s
#[derive(Debug, Clone, Default)]
pub struct DataLoader;

impl DataLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a comma-separated file with a header row.
    ///
    /// Column types are inferred from every row, so a column that only turns
    /// fractional late in the file still loads as floats.
    pub fn load_csv(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            WineError::DataError(format!("Failed to open {}: {}", path.display(), e))
        })?;

        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| WineError::DataError(e.to_string()))
    }

    /// Load a CSV and split it into every non-target column plus the target.
    ///
    /// Empty cells and non-numeric values are rejected rather than imputed.
    pub fn load_dataset(&self, path: impl AsRef<Path>, target: &str) -> Result<Dataset> {
        let start = Instant::now();
        let path = path.as_ref();
        let df = self.load_csv(path)?;

        if df.height() == 0 {
            return Err(WineError::DataError(format!("{} has no rows", path.display())));
        }

        let feature_names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .filter(|name| name.as_str() != target)
            .map(|s| s.to_string())
            .collect();

        if feature_names.len() == df.width() {
            return Err(WineError::FeatureNotFound(target.to_string()));
        }

        let y = Array1::from(column_values(&df, target)?);
        let x = columns_to_array2(&df, &feature_names)?;

        info!(
            path = %path.display(),
            rows = df.height(),
            features = feature_names.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );

        Dataset::new(feature_names, x, y)
    }
}

fn column_values(df: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = df
        .column(name)
        .map_err(|_| WineError::FeatureNotFound(name.to_string()))?;
    let as_f64 = column
        .cast(&DataType::Float64)
        .map_err(|e| WineError::DataError(format!("Column '{}': {}", name, e)))?;

    as_f64
        .f64()
        .map_err(|e| WineError::DataError(e.to_string()))?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                WineError::DataError(format!(
                    "Column '{}' has a missing or non-numeric value at row {}",
                    name, row
                ))
            })
        })
        .collect()
}

/// Extract named columns into a row-major matrix
fn columns_to_array2(df: &DataFrame, col_names: &[String]) -> Result<Array2<f64>> {
    let col_data: Vec<Vec<f64>> = col_names
        .iter()
        .map(|name| column_values(df, name))
        .collect::<Result<_>>()?;

    Ok(Array2::from_shape_fn((df.height(), col_names.len()), |(r, c)| {
        col_data[c][r]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_dataset_separates_target() {
        let file = write_csv("a,quality,b\n1.0,5,2.0\n3.0,6,4.0\n");
        let data = DataLoader::new().load_dataset(file.path(), "quality").unwrap();

        assert_eq!(data.feature_names, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(data.features.row(1).to_vec(), vec![3.0, 4.0]);
        assert_eq!(data.target.to_vec(), vec![5.0, 6.0]);
    }

    #[test]
    fn test_missing_target_column() {
        let file = write_csv("a,b\n1,2\n");
        let err = DataLoader::new().load_dataset(file.path(), "quality").unwrap_err();
        assert!(matches!(err, WineError::FeatureNotFound(_)));
    }

    #[test]
    fn test_empty_cell_is_rejected() {
        let file = write_csv("a,quality\n1.0,5\n,6\n");
        assert!(DataLoader::new().load_dataset(file.path(), "quality").is_err());
    }

    #[test]
    fn test_column_turning_fractional_late() {
        let mut csv = String::from("a,b,quality\n");
        for row in 0..150 {
            let b = if row < 120 { format!("{}", row % 40) } else { "11.5".to_string() };
            csv.push_str(&format!("{}.25,{},{}\n", row, b, 5 + row % 3));
        }
        let file = write_csv(&csv);
        let data = DataLoader::new().load_dataset(file.path(), "quality").unwrap();

        assert_eq!(data.n_samples(), 150);
        assert_eq!(data.features[[0, 1]], 0.0);
        assert_eq!(data.features[[149, 1]], 11.5);
        assert_eq!(data.target[2], 7.0);
    }

    #[test]
    fn test_missing_file() {
        assert!(DataLoader::new().load_csv("/nonexistent/wine.csv").is_err());
    }
}
