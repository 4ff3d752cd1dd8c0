//! Liveness and readiness checks.

use std::sync::Arc;

use axum::extract::State;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthView {
    pub status: &'static str,
}

/// `GET /health`: 200 when the database answers, 503 otherwise.
pub async fn health(State(state): State<Arc<AppState>>) -> ApiResult<ApiResponse<HealthView>> {
    if !state.db.health_check().await {
        return Err(ApiError::unavailable());
    }
    Ok(ApiResponse::ok("Service is healthy", HealthView { status: "ok" }))
}
