//! Error types for the server

use crate::features::FeatureError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Missing required features")]
    MissingFeatures,

    #[error("Invalid input data")]
    InvalidInput,

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<FeatureError> for ServerError {
    fn from(err: FeatureError) -> Self {
        match err {
            FeatureError::Missing(_) => ServerError::MissingFeatures,
            FeatureError::Invalid { .. } | FeatureError::NotAnObject => ServerError::InvalidInput,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::MissingFeatures | ServerError::InvalidInput => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ServerError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ServerError::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, self.to_string()),
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "An internal error occurred".to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_error_mapping() {
        let missing = ServerError::from(FeatureError::Missing(vec!["pH".to_string()]));
        assert_eq!(missing.to_string(), "Missing required features");

        let invalid = ServerError::from(FeatureError::NotAnObject);
        assert_eq!(invalid.to_string(), "Invalid input data");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ServerError::InvalidInput.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServerError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServerError::Internal("x".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
