//! API route definitions

use super::error::ServerError;
use super::{handlers, state::AppState};
use axum::{
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

async fn handle_404() -> impl IntoResponse {
    ServerError::NotFound
}

async fn handle_405() -> impl IntoResponse {
    ServerError::MethodNotAllowed
}

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/predict", post(handlers::predict))
        .fallback(handle_404)
        .method_not_allowed_fallback(handle_405)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
