//! Request handlers

use super::error::{Result, ServerError};
use super::state::AppState;
use crate::features::parse_features;
use axum::{body::Bytes, extract::rejection::BytesRejection, extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub prediction: f64,
}

pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse { message: "pong" })
}

/// Score one wine sample.
///
/// The body is decoded by hand rather than through the `Json` extractor so
/// that a missing or wrong content type, malformed JSON, or a body over the
/// default 2 MB limit yields the same 400 body as any other invalid input.
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Bytes, BytesRejection>,
) -> Result<Json<PredictResponse>> {
    let body = body.map_err(|e| {
        debug!(reason = %e, "Unreadable prediction body");
        ServerError::InvalidInput
    })?;
    let value: serde_json::Value =
        serde_json::from_slice(&body).map_err(|_| ServerError::InvalidInput)?;
    let features = parse_features(&value).map_err(|e| {
        debug!(reason = %e, "Rejected prediction request");
        ServerError::from(e)
    })?;

    let prediction = state
        .artifact
        .predict_row(features.as_slice())
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    if !prediction.is_finite() {
        return Err(ServerError::InvalidInput);
    }
    Ok(Json(PredictResponse { prediction }))
}
