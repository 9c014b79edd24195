//! Error types for the wine quality crate

use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, WineError>;

/// Main error type shared by training, tracking and serving
#[derive(Error, Debug)]
pub enum WineError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Model artifact expects features [{actual}], serving contract requires [{expected}]")]
    IncompatibleArtifact { expected: String, actual: String },

    #[error("Tracking error: {0}")]
    TrackingError(String),

    #[error("No active run")]
    NoActiveRun,
}

impl From<polars::error::PolarsError> for WineError {
    fn from(err: polars::error::PolarsError) -> Self {
        WineError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for WineError {
    fn from(err: serde_json::Error) -> Self {
        WineError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for WineError {
    fn from(err: ndarray::ShapeError) -> Self {
        WineError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
